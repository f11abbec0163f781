use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "screenings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub movie_id: i32,
    pub cinema_id: i32,
    pub url: Option<String>,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub draft: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movie::Entity",
        from = "Column::MovieId",
        to = "super::movie::Column::Id",
        on_delete = "Cascade"
    )]
    Movie,
    #[sea_orm(
        belongs_to = "super::cinema::Entity",
        from = "Column::CinemaId",
        to = "super::cinema::Column::Id",
        on_delete = "Cascade"
    )]
    Cinema,
    #[sea_orm(has_many = "super::screening_date::Entity")]
    ScreeningDate,
    #[sea_orm(has_many = "super::poster_fetch_attempt::Entity")]
    PosterFetchAttempt,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movie.def()
    }
}

impl Related<super::cinema::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cinema.def()
    }
}

impl Related<super::screening_date::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScreeningDate.def()
    }
}

impl Related<super::poster_fetch_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PosterFetchAttempt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
