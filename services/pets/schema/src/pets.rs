use sea_orm::entity::prelude::*;

/// Pet aggregate row. `version` guards concurrent updates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub pet_type_id: Uuid,
    /// One of `available`, `reserved`, `adopted`.
    pub status: String,
    pub version: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pet_types::Entity",
        from = "Column::PetTypeId",
        to = "super::pet_types::Column::Id"
    )]
    PetType,
}

impl Related<super::pet_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PetType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
