//! Entity and relation metadata consumed by the extraction engine.
//!
//! A [`RelationBinding`] is resolved once by whoever builds the registry; the
//! engine only ever matches on its variant.

use indexmap::IndexMap;

use crate::Name;

/// The plain discriminant of a [`RelationBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BelongsTo,
    BelongsToPolymorphic,
    HasMany,
    HasManyThrough,
    HasOne,
    HasOneThrough,
    HasAndBelongsToMany,
}

impl RelationKind {
    /// Whether the relation resolves to a list rather than a single record.
    pub const fn is_many(self) -> bool {
        matches!(
            self,
            RelationKind::HasMany | RelationKind::HasManyThrough | RelationKind::HasAndBelongsToMany
        )
    }
}

/// Join table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    pub table: Name,
    /// Column holding the source entity's key (`blog_post_id`).
    pub source_column: Name,
    /// Column holding the target entity's key (`category_id`).
    pub target_column: Name,
}

/// One concrete entity a polymorphic relation can point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymorphicTarget {
    pub entity: Name,
    /// Field on the target matched against the source's foreign key.
    pub key: Name,
}

/// How a source entity connects to its related rows.
///
/// `source_key` fields live on the entity declaring the relation,
/// `target_key`/`foreign_key` on the related entity unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationBinding {
    /// `source.foreign_key ↔ target.target_key`
    BelongsTo {
        target: Name,
        foreign_key: Name,
        target_key: Name,
    },
    /// `(source.foreign_key, source.type_field) ↔ target.key`, per concrete type.
    BelongsToPolymorphic {
        foreign_key: Name,
        type_field: Name,
        targets: IndexMap<Name, PolymorphicTarget>,
    },
    /// `target.foreign_key ↔ source.source_key`
    HasMany {
        target: Name,
        foreign_key: Name,
        source_key: Name,
        /// Type column on the target when this is the inverse of a
        /// polymorphic belongs-to.
        as_type: Option<Name>,
        ids_field: Name,
    },
    HasOne {
        target: Name,
        foreign_key: Name,
        source_key: Name,
        as_type: Option<Name>,
    },
    /// Reaches `source` on the entity behind the `through` relation.
    HasManyThrough { through: Name, source: Name },
    HasOneThrough { through: Name, source: Name },
    HasAndBelongsToMany {
        target: Name,
        join_table: JoinTable,
        source_key: Name,
        target_key: Name,
        ids_field: Name,
    },
}

impl RelationBinding {
    pub const fn kind(&self) -> RelationKind {
        match self {
            RelationBinding::BelongsTo { .. } => RelationKind::BelongsTo,
            RelationBinding::BelongsToPolymorphic { .. } => RelationKind::BelongsToPolymorphic,
            RelationBinding::HasMany { .. } => RelationKind::HasMany,
            RelationBinding::HasOne { .. } => RelationKind::HasOne,
            RelationBinding::HasManyThrough { .. } => RelationKind::HasManyThrough,
            RelationBinding::HasOneThrough { .. } => RelationKind::HasOneThrough,
            RelationBinding::HasAndBelongsToMany { .. } => RelationKind::HasAndBelongsToMany,
        }
    }

    /// Fields the source entity must project so this relation can be correlated.
    ///
    /// Through relations report nothing here; they need the keys of the
    /// relation they go through.
    pub fn source_fields(&self) -> Vec<&Name> {
        match self {
            RelationBinding::BelongsTo { foreign_key, .. } => vec![foreign_key],
            RelationBinding::BelongsToPolymorphic {
                foreign_key,
                type_field,
                ..
            } => vec![foreign_key, type_field],
            RelationBinding::HasMany { source_key, .. }
            | RelationBinding::HasOne { source_key, .. }
            | RelationBinding::HasAndBelongsToMany { source_key, .. } => vec![source_key],
            RelationBinding::HasManyThrough { .. } | RelationBinding::HasOneThrough { .. } => {
                Vec::new()
            }
        }
    }

    /// `(source field, target field)` pair for the single-hop kinds.
    pub fn correlation(&self) -> Option<(&Name, &Name)> {
        match self {
            RelationBinding::BelongsTo {
                foreign_key,
                target_key,
                ..
            } => Some((foreign_key, target_key)),
            RelationBinding::HasMany {
                foreign_key,
                source_key,
                ..
            }
            | RelationBinding::HasOne {
                foreign_key,
                source_key,
                ..
            } => Some((source_key, foreign_key)),
            _ => None,
        }
    }

    /// Target entity of the single-target kinds.
    pub fn target(&self) -> Option<&Name> {
        match self {
            RelationBinding::BelongsTo { target, .. }
            | RelationBinding::HasMany { target, .. }
            | RelationBinding::HasOne { target, .. }
            | RelationBinding::HasAndBelongsToMany { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Output field carrying the id list, for kinds that have one.
    pub fn ids_field(&self) -> Option<&Name> {
        match self {
            RelationBinding::HasMany { ids_field, .. }
            | RelationBinding::HasAndBelongsToMany { ids_field, .. } => Some(ids_field),
            _ => None,
        }
    }
}

/// Translation table behind an entity's localized attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translations {
    pub table: Name,
    /// Column on the translation table pointing back at the entity.
    pub foreign_key: Name,
    pub locale_column: Name,
    pub fields: Vec<Name>,
}

impl Translations {
    pub fn new(table: impl Into<Name>, foreign_key: impl Into<Name>) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            locale_column: Name::const_new("locale"),
            fields: Vec::new(),
        }
    }

    pub fn locale_column(mut self, column: impl Into<Name>) -> Self {
        self.locale_column = column.into();
        self
    }

    pub fn fields<I, N>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn translates(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Everything the engine needs to know about one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    /// Entity (type) name, also the value stored in polymorphic type columns.
    pub name: Name,
    pub table: Name,
    pub primary_key: Name,
    /// Scalar fields in declaration order, primary key included.
    pub fields: Vec<Name>,
    pub relations: IndexMap<Name, RelationBinding>,
    pub translations: Option<Translations>,
}

impl EntitySchema {
    /// Starts a schema with an `id` primary key.
    pub fn new(name: impl Into<Name>, table: impl Into<Name>) -> Self {
        let primary_key = Name::const_new("id");
        Self {
            name: name.into(),
            table: table.into(),
            fields: vec![primary_key.clone()],
            primary_key,
            relations: IndexMap::new(),
            translations: None,
        }
    }

    /// Relations already declared on the old key move to the new one.
    pub fn primary_key(mut self, field: impl Into<Name>) -> Self {
        let field = field.into();
        if let Some(slot) = self.fields.iter_mut().find(|f| **f == self.primary_key) {
            *slot = field.clone();
        }
        for binding in self.relations.values_mut() {
            match binding {
                RelationBinding::HasMany { source_key, .. }
                | RelationBinding::HasOne { source_key, .. }
                | RelationBinding::HasAndBelongsToMany { source_key, .. }
                    if *source_key == self.primary_key =>
                {
                    *source_key = field.clone();
                }
                _ => {}
            }
        }
        self.primary_key = field;
        self
    }

    pub fn fields<I, N>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    pub fn translations(mut self, translations: Translations) -> Self {
        self.translations = Some(translations);
        self
    }

    pub fn relation(mut self, name: impl Into<Name>, binding: RelationBinding) -> Self {
        self.relations.insert(name.into(), binding);
        self
    }

    pub fn belongs_to(self, name: &str, target: impl Into<Name>, foreign_key: impl Into<Name>) -> Self {
        self.relation(
            name,
            RelationBinding::BelongsTo {
                target: target.into(),
                foreign_key: foreign_key.into(),
                target_key: Name::const_new("id"),
            },
        )
    }

    /// `targets` are the concrete entity names the type column may hold.
    pub fn belongs_to_polymorphic<I, N>(self, name: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let targets = targets
            .into_iter()
            .map(|t| {
                let entity = t.into();
                (
                    entity.clone(),
                    PolymorphicTarget {
                        entity,
                        key: Name::const_new("id"),
                    },
                )
            })
            .collect();
        let binding = RelationBinding::BelongsToPolymorphic {
            foreign_key: compact_str::format_compact!("{name}_id"),
            type_field: compact_str::format_compact!("{name}_type"),
            targets,
        };
        self.relation(name, binding)
    }

    pub fn has_many(self, name: &str, target: impl Into<Name>, foreign_key: impl Into<Name>) -> Self {
        let source_key = self.primary_key.clone();
        self.relation(
            name,
            RelationBinding::HasMany {
                target: target.into(),
                foreign_key: foreign_key.into(),
                source_key,
                as_type: None,
                ids_field: ids_field_for(name),
            },
        )
    }

    /// Inverse side of a polymorphic belongs-to: `as_name` is the relation
    /// name on the target (`subject` → `subject_id`, `subject_type`).
    pub fn has_many_as(self, name: &str, target: impl Into<Name>, as_name: &str) -> Self {
        let source_key = self.primary_key.clone();
        self.relation(
            name,
            RelationBinding::HasMany {
                target: target.into(),
                foreign_key: compact_str::format_compact!("{as_name}_id"),
                source_key,
                as_type: Some(compact_str::format_compact!("{as_name}_type")),
                ids_field: ids_field_for(name),
            },
        )
    }

    pub fn has_one(self, name: &str, target: impl Into<Name>, foreign_key: impl Into<Name>) -> Self {
        let source_key = self.primary_key.clone();
        self.relation(
            name,
            RelationBinding::HasOne {
                target: target.into(),
                foreign_key: foreign_key.into(),
                source_key,
                as_type: None,
            },
        )
    }

    pub fn has_one_as(self, name: &str, target: impl Into<Name>, as_name: &str) -> Self {
        let source_key = self.primary_key.clone();
        self.relation(
            name,
            RelationBinding::HasOne {
                target: target.into(),
                foreign_key: compact_str::format_compact!("{as_name}_id"),
                source_key,
                as_type: Some(compact_str::format_compact!("{as_name}_type")),
            },
        )
    }

    pub fn has_many_through(self, name: &str, through: &str, source: &str) -> Self {
        self.relation(
            name,
            RelationBinding::HasManyThrough {
                through: through.into(),
                source: source.into(),
            },
        )
    }

    pub fn has_one_through(self, name: &str, through: &str, source: &str) -> Self {
        self.relation(
            name,
            RelationBinding::HasOneThrough {
                through: through.into(),
                source: source.into(),
            },
        )
    }

    pub fn has_and_belongs_to_many(self, name: &str, target: impl Into<Name>, join_table: JoinTable) -> Self {
        let source_key = self.primary_key.clone();
        self.relation(
            name,
            RelationBinding::HasAndBelongsToMany {
                target: target.into(),
                join_table,
                source_key,
                target_key: Name::const_new("id"),
                ids_field: ids_field_for(name),
            },
        )
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn relation_named(&self, name: &str) -> Option<&RelationBinding> {
        self.relations.get(name)
    }
}

/// `blog_posts` → `blog_post_ids`, `categories` → `category_ids`.
pub fn ids_field_for(relation: &str) -> Name {
    // Only the plural forms relation names realistically use.
    let singular: Name = if let Some(stem) = relation.strip_suffix("ies") {
        compact_str::format_compact!("{stem}y")
    } else if relation.ends_with("sses") {
        Name::from(&relation[..relation.len() - 2])
    } else {
        Name::from(relation.strip_suffix('s').unwrap_or(relation))
    };
    compact_str::format_compact!("{singular}_ids")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_fields_are_singular() {
        assert_eq!(ids_field_for("blog_posts"), "blog_post_ids");
        assert_eq!(ids_field_for("categories"), "category_ids");
        assert_eq!(ids_field_for("addresses"), "address_ids");
        assert_eq!(ids_field_for("staff"), "staff_ids");
    }

    #[test]
    fn polymorphic_helper_derives_key_and_type_columns() {
        let post = EntitySchema::new("BlogPost", "blog_posts")
            .fields(["title", "subject_id", "subject_type"])
            .belongs_to_polymorphic("subject", ["Author", "Category"]);

        let binding = post.relation_named("subject").unwrap();
        assert_eq!(binding.kind(), RelationKind::BelongsToPolymorphic);
        assert_eq!(binding.source_fields(), vec!["subject_id", "subject_type"]);
    }

    #[test]
    fn has_many_correlates_parent_key_with_target_foreign_key() {
        let author = EntitySchema::new("Author", "authors").has_many(
            "blog_posts",
            "BlogPost",
            "author_id",
        );
        let binding = author.relation_named("blog_posts").unwrap();
        let (source, target) = binding.correlation().unwrap();
        assert_eq!(source, "id");
        assert_eq!(target, "author_id");
        assert_eq!(binding.ids_field().unwrap(), "blog_post_ids");
    }

    #[test]
    fn primary_key_applies_to_relations_declared_before_it() {
        let author = EntitySchema::new("Author", "authors")
            .has_many("blog_posts", "BlogPost", "author_id")
            .primary_key("author_no");

        assert_eq!(author.fields, vec!["author_no"]);
        let (source, _) = author.relation_named("blog_posts").unwrap().correlation().unwrap();
        assert_eq!(source, "author_no");
    }
}
