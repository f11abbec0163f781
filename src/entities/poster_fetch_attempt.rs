use sea_orm::entity::prelude::*;

/// One poster lookup for a screening against a named source.
/// `status` is `success`, `not_found` or `error`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "poster_fetch_attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub screening_id: i32,
    pub source: String,
    pub status: String,
    pub attempted_at: String,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::screening::Entity",
        from = "Column::ScreeningId",
        to = "super::screening::Column::Id",
        on_delete = "Cascade"
    )]
    Screening,
}

impl Related<super::screening::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Screening.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
