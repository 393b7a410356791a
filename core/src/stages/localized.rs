use compact_str::format_compact;

use crate::error::Result;
use crate::locale::translation_alias;
use crate::pipeline::Stage;
use crate::plan::QueryPlan;
use crate::schema::{EntitySchema, Translations};
use crate::source::{Join, JoinOn, SourceExpr};
use crate::Value;

/// Serves translated attributes from the entity's translation table.
///
/// A translated name in `attributes` becomes a coalesce over the current
/// locale's fallback chain, one left outer join per locale. Each
/// `localized` pair is read from its own locale as `field_locale`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalizedAttributes;

impl Stage for LocalizedAttributes {
    fn name(&self) -> &'static str {
        "localized_attributes"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        let level = plan.level;
        let Some(translations) = &level.entity.translations else {
            return Ok(());
        };

        let translated: Vec<_> = plan
            .attributes
            .iter()
            .filter(|a| translations.translates(a))
            .cloned()
            .collect();
        plan.attributes.retain(|a| !translations.translates(a));

        if translated.is_empty() && level.spec.localized.is_empty() {
            return Ok(());
        }

        let chain = level.env.localizer.chain();
        for locale in &chain {
            plan.join(translation_join(level.entity, translations, locale));
        }
        for field in translated {
            let fallbacks = chain
                .iter()
                .map(|locale| SourceExpr::joined(translation_alias(locale), field.clone()))
                .collect();
            plan.project(field, SourceExpr::Coalesce(fallbacks));
        }

        for (locale, fields) in &level.spec.localized {
            // Locales of the chain are already joined.
            plan.join(translation_join(level.entity, translations, locale));
            let alias = translation_alias(locale);
            for field in fields {
                plan.project(
                    format_compact!("{field}_{locale}"),
                    SourceExpr::joined(alias.clone(), field.clone()),
                );
            }
        }
        Ok(())
    }
}

fn translation_join(entity: &EntitySchema, translations: &Translations, locale: &str) -> Join {
    Join {
        table: translations.table.clone(),
        alias: translation_alias(locale),
        on: vec![
            JoinOn::Columns {
                base_column: entity.primary_key.clone(),
                joined_column: translations.foreign_key.clone(),
            },
            JoinOn::Value {
                joined_column: translations.locale_column.clone(),
                value: Value::from(locale),
            },
        ],
    }
}
