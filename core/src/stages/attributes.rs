use crate::error::Result;
use crate::pipeline::Stage;
use crate::plan::QueryPlan;

/// Projects the requested scalar columns, or every scalar field when the
/// spec names none.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attributes;

impl Stage for Attributes {
    fn name(&self) -> &'static str {
        "attributes"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        let entity = plan.level.entity;
        // Translated names are only served through the translation joins.
        let attributes = std::mem::take(&mut plan.attributes);
        for attribute in attributes.iter().filter(|a| entity.has_field(a)) {
            plan.project_column(attribute);
        }
        Ok(())
    }
}
