mod common;

use cinemaempoa::{
    entities::screening,
    error::{ImportError, PosterError},
    movies,
    poster::{PosterStorage, StoredPoster},
    reconciler::Reconciler,
    store,
};
use common::*;
use sea_orm::EntityTrait;
use serde_json::json;

const LOBO: &str = "Lobo e Cão";

async fn screening_for(db: &sea_orm::DatabaseConnection, title: &str, cinema: &str) -> screening::Model {
    let movie = movies::get_or_create(db, title).await.unwrap();
    store::find_screening(db, movie.id, cinema_id(db, cinema).await).await.unwrap().unwrap()
}

#[tokio::test]
async fn overwrite_same_day_cinema_replaces_known_dates() {
    let t = setup().await;
    let (_, existing) =
        movie_with_screening(&t.db, LOBO, "lobo-e-cao", "capitolio", &["2025-12-25T11:00", "2025-12-26T13:00"])
            .await;

    let result = single_feature("capitolio", LOBO, json!(["2025-12-25T12:00", "2025-12-27T14:00"]));
    let policies = policies();
    let touched = Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();

    assert_eq!(touched, 1);
    assert_eq!(
        dates_of(&t.db, existing.id).await,
        vec!["2025-12-26T13:00", "2025-12-25T12:00", "2025-12-27T14:00"]
    );
    assert_eq!(counts(&t.db).await, (1, 1, 3));
}

#[tokio::test]
async fn accumulate_cinemas_keep_every_known_date() {
    for cinema in ["cinebancarios", "paulo-amorim", "sala-redencao"] {
        let t = setup().await;
        let (_, existing) = movie_with_screening(
            &t.db,
            LOBO,
            "lobo-e-cao",
            cinema,
            &["2025-12-25T11:00", "2025-12-26T13:00"],
        )
        .await;

        let result = single_feature(cinema, LOBO, json!(["2025-12-25T12:00", "2025-12-27T14:00"]));
        let policies = policies();
        Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();

        assert_eq!(
            dates_of(&t.db, existing.id).await,
            vec!["2025-12-25T11:00", "2025-12-26T13:00", "2025-12-25T12:00", "2025-12-27T14:00"],
            "{cinema}"
        );
    }
}

#[tokio::test]
async fn repeated_import_is_idempotent() {
    let t = setup().await;
    let policies = policies();
    let reconciler = Reconciler::new(&policies, &NoPosters).with_now(now());

    for cinema in ["capitolio", "cinebancarios"] {
        let result = single_feature(cinema, LOBO, json!(["2025-12-25T12:00", "2025-12-27T14:00"]));
        reconciler.import(&t.db, &result).await.unwrap();
        let screening = screening_for(&t.db, LOBO, cinema).await;
        let first = store::screening_dates(&t.db, screening.id).await.unwrap();

        reconciler.import(&t.db, &result).await.unwrap();
        let second = store::screening_dates(&t.db, screening.id).await.unwrap();

        assert_eq!(first, second, "{cinema}");
    }
    assert_eq!(counts(&t.db).await, (1, 2, 4));
}

#[tokio::test]
async fn superset_import_is_additive() {
    let t = setup().await;
    let policies = policies();
    let reconciler = Reconciler::new(&policies, &NoPosters).with_now(now());

    let a = single_feature("cinebancarios", LOBO, json!(["2025-12-25T12:00", "2025-12-26T12:00"]));
    let b = single_feature("cinebancarios", LOBO, json!(["2025-12-26T12:00", "2025-12-26T18:00"]));
    reconciler.import(&t.db, &a).await.unwrap();
    reconciler.import(&t.db, &b).await.unwrap();

    let screening = screening_for(&t.db, LOBO, "cinebancarios").await;
    assert_eq!(
        dates_of(&t.db, screening.id).await,
        vec!["2025-12-25T12:00", "2025-12-26T12:00", "2025-12-26T18:00"]
    );
}

#[tokio::test]
async fn unknown_cinema_aborts_without_writes() {
    let t = setup().await;
    let result = scrape_result(json!([
        {
            "url": "", "cinema": "CineBancários", "slug": "cinebancarios",
            "features": [{"title": LOBO, "excerpt": "cool film", "time": "19h"}],
        },
        {
            "url": "", "cinema": "Nowhere", "slug": "cine-nowhere",
            "features": [{"title": "Outro Filme", "excerpt": "", "time": "20h"}],
        },
    ]));

    let policies = policies();
    let err = Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap_err();

    assert!(matches!(err, ImportError::UnknownCinema(ref slug) if slug == "cine-nowhere"));
    assert_eq!(counts(&t.db).await, (0, 0, 0));
}

#[tokio::test]
async fn invalid_structured_time_aborts_without_writes() {
    let t = setup().await;
    let result = scrape_result(json!({"cinemas": [{
        "url": "", "cinema": "Capitólio", "slug": "capitolio",
        "features": [
            {"title": "Primeiro", "excerpt": "", "time": ["2025-12-25T12:00"]},
            {"title": "Segundo", "excerpt": "", "time": ["25/12 às 12h"]},
        ],
    }]}));

    let policies = policies();
    let err = Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap_err();

    assert!(matches!(err, ImportError::InvalidShowtime { ref value, .. } if value == "25/12 às 12h"));
    assert_eq!(counts(&t.db).await, (0, 0, 0));
}

#[tokio::test]
async fn new_screening_is_a_draft_with_description_and_link() {
    let t = setup().await;
    let result = scrape_result(json!({"cinemas": [{
        "url": "https://www.cinematecapauloamorim.com.br",
        "cinema": "Cinemateca Paulo Amorim",
        "slug": "paulo-amorim",
        "features": [{
            "title": "O Agente Secreto",
            "excerpt": "Recife, 1977.",
            "original_title": "O Agente Secreto",
            "price": "R$ 16",
            "director": false,
            "classification": "16 anos",
            "general_info": null,
            "read_more": "https://www.cinematecapauloamorim.com.br/filme/o-agente-secreto",
            "poster": "https://example.com/agente.jpg",
            "time": "15h15/ 19h30",
        }],
    }]}));

    let policies = policies();
    Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();

    let screening = screening_for(&t.db, "O Agente Secreto", "paulo-amorim").await;
    assert!(screening.draft);
    assert_eq!(screening.description, "O Agente Secreto\nR$ 16\n16 anos\nRecife, 1977.");
    assert_eq!(
        screening.url.as_deref(),
        Some("https://www.cinematecapauloamorim.com.br/filme/o-agente-secreto")
    );
    // the poster failed to download; the screening is kept without it
    assert_eq!(screening.image, None);
    assert_eq!(dates_of(&t.db, screening.id).await, vec!["2025-12-20T15:15", "2025-12-20T19:30"]);
}

#[tokio::test]
async fn stored_poster_is_attached_to_new_screening() {
    let t = setup().await;
    let result = scrape_result(json!({"cinemas": [{
        "url": "", "cinema": "Sala Redenção", "slug": "sala-redencao",
        "features": [{"title": LOBO, "excerpt": "", "poster": "https://example.com/lobo.png"}],
    }]}));

    let policies = policies();
    Reconciler::new(&policies, &FakePosters).with_now(now()).import(&t.db, &result).await.unwrap();

    let screening = screening_for(&t.db, LOBO, "sala-redencao").await;
    assert_eq!(screening.image.as_deref(), Some("lobo.png"));
    assert_eq!((screening.image_width, screening.image_height), (Some(500), Some(750)));
}

#[tokio::test]
async fn merge_path_leaves_screening_metadata_alone() {
    let t = setup().await;
    let (_, existing) =
        movie_with_screening(&t.db, LOBO, "lobo-e-cao", "cinebancarios", &["2025-12-25T11:00"]).await;

    let result = scrape_result(json!({"cinemas": [{
        "url": "", "cinema": "CineBancários", "slug": "cinebancarios",
        "features": [{
            "title": LOBO, "excerpt": "nova sinopse",
            "poster": "https://example.com/lobo.png", "time": ["2025-12-26T11:00"],
        }],
    }]}));
    let policies = policies();
    Reconciler::new(&policies, &FakePosters).with_now(now()).import(&t.db, &result).await.unwrap();

    let after = screening::Entity::find_by_id(existing.id).one(&t.db).await.unwrap().unwrap();
    assert_eq!(after.description, existing.description);
    assert_eq!(after.image, None);
    assert_eq!(after.draft, existing.draft);
    assert_eq!(dates_of(&t.db, existing.id).await, vec!["2025-12-25T11:00", "2025-12-26T11:00"]);
}

#[tokio::test]
async fn features_without_usable_time_get_the_current_time() {
    let t = setup().await;
    let result = scrape_result(json!({"cinemas": [{
        "url": "", "cinema": "CineBancários", "slug": "cinebancarios",
        "features": [
            {"title": "Sem Horário", "excerpt": ""},
            {"title": "Horário Vazio", "excerpt": "", "time": ""},
            {"title": "Horário Estranho", "excerpt": "", "time": "em breve"},
        ],
    }]}));

    let policies = policies();
    let touched = Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();
    assert_eq!(touched, 3);

    for title in ["Sem Horário", "Horário Vazio", "Horário Estranho"] {
        let screening = screening_for(&t.db, title, "cinebancarios").await;
        assert_eq!(dates_of(&t.db, screening.id).await, vec!["2025-12-20T10:30"], "{title}");
    }
}

#[tokio::test]
async fn titles_with_the_same_slug_share_a_movie() {
    let t = setup().await;
    let result = scrape_result(json!({"cinemas": [
        {"url": "", "cinema": "Capitólio", "slug": "capitolio",
         "features": [{"title": "Lobo e Cão", "excerpt": "", "time": "19h"}]},
        {"url": "", "cinema": "CineBancários", "slug": "cinebancarios",
         "features": [{"title": "LOBO E CAO", "excerpt": "", "time": "20h"}]},
    ]}));

    let policies = policies();
    Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();

    let (movies, screenings, _) = counts(&t.db).await;
    assert_eq!((movies, screenings), (1, 2));
    let movie = store::find_movie_by_slug(&t.db, "lobo-e-cao").await.unwrap().unwrap();
    assert_eq!(movie.title, "Lobo e Cão");
}

#[tokio::test]
async fn titles_in_other_scripts_get_their_own_movies() {
    let t = setup().await;
    let notebook = movies::get_or_create(&t.db, "Тетрадь").await.unwrap();
    let spirited_away = movies::get_or_create(&t.db, "千と千尋の神隠し").await.unwrap();

    assert_ne!(notebook.id, spirited_away.id);
    assert_eq!(notebook.title, "Тетрадь");
    assert_eq!(spirited_away.title, "千と千尋の神隠し");
    assert_eq!(movies::get_or_create(&t.db, "Тетрадь").await.unwrap().id, notebook.id);
}

#[tokio::test]
async fn repeated_times_in_one_feature_are_stored_once() {
    let t = setup().await;
    let result = single_feature("cinebancarios", LOBO, json!("15h/ 15h"));

    let policies = policies();
    Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();

    let screening = screening_for(&t.db, LOBO, "cinebancarios").await;
    assert_eq!(dates_of(&t.db, screening.id).await, vec!["2025-12-20T15:00"]);

    let again = single_feature("cinebancarios", LOBO, json!(["2025-12-21T18:00", "2025-12-21T18:00"]));
    Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &again).await.unwrap();
    assert_eq!(dates_of(&t.db, screening.id).await, vec!["2025-12-20T15:00", "2025-12-21T18:00"]);
}

/// Storage that writes to the catalog while "downloading", which only
/// succeeds when no import transaction holds the write lock.
struct WritingPosters {
    db: sea_orm::DatabaseConnection,
}

#[async_trait::async_trait]
impl PosterStorage for WritingPosters {
    async fn store(&self, url: &str) -> Result<StoredPoster, PosterError> {
        store::create_movie(&self.db, "Nosferatu", "nosferatu")
            .await
            .map_err(|err| PosterError::Io(std::io::Error::other(err.to_string())))?;
        FakePosters.store(url).await
    }
}

#[tokio::test]
async fn posters_are_downloaded_outside_the_import_transaction() {
    let t = setup().await;
    let result = scrape_result(json!({"cinemas": [{
        "url": "", "cinema": "Sala Redenção", "slug": "sala-redencao",
        "features": [{"title": LOBO, "excerpt": "", "poster": "https://example.com/lobo.png", "time": "19h"}],
    }]}));

    let storage = WritingPosters { db: t.db.clone() };
    let policies = policies();
    Reconciler::new(&policies, &storage).with_now(now()).import(&t.db, &result).await.unwrap();

    let screening = screening_for(&t.db, LOBO, "sala-redencao").await;
    assert_eq!(screening.image.as_deref(), Some("lobo.png"));
    assert!(store::find_movie_by_slug(&t.db, "nosferatu").await.unwrap().is_some());
}

#[tokio::test]
async fn lowest_id_screening_receives_the_merge_when_rows_are_doubled() {
    let t = setup().await;
    let (movie, first) =
        movie_with_screening(&t.db, LOBO, "lobo-e-cao", "cinebancarios", &["2025-12-25T11:00"]).await;
    let second = add_screening(&t.db, &movie, "cinebancarios", &["2025-12-26T13:00"]).await;
    assert!(first.id < second.id);

    let result = single_feature("cinebancarios", LOBO, json!(["2025-12-27T14:00"]));
    let policies = policies();
    let touched = Reconciler::new(&policies, &NoPosters).with_now(now()).import(&t.db, &result).await.unwrap();

    assert_eq!(touched, 1);
    assert_eq!(dates_of(&t.db, first.id).await, vec!["2025-12-25T11:00", "2025-12-27T14:00"]);
    assert_eq!(dates_of(&t.db, second.id).await, vec!["2025-12-26T13:00"]);
    assert_eq!(counts(&t.db).await, (1, 2, 3));
}
