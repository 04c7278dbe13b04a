use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbImage};
use time::macros::{date, datetime};
use time::Month;
use uuid::Uuid;

use super::{App, AppError, CreatePlant};
use crate::analysis::fixtures::sample_analysis;
use crate::analysis::{AnalysisError, AnalysisResult, Analyzer, CancellationToken, MoistureReader};
use crate::config::Settings;
use crate::domain::fertilizer::FertilizerKind;
use crate::domain::measures::PlantMeasures;
use crate::history::{HistoryError, HistoryKind};
use crate::schedule::DueStatus;
use crate::store::{MemorySlots, StoreError};

fn memory_app() -> App {
    App::with_backend(MemorySlots::new(), &Settings::default())
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, [30, 120, 40].into()));
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .expect("png encoding should work");
    buf.into_inner()
}

fn create(app: &App, location: &str) -> crate::domain::plant::PlantRecord {
    app.create_plant(CreatePlant {
        images: vec!["data:image/jpeg;base64,AA".to_string()],
        analysis: sample_analysis(),
        location: location.to_string(),
        user_measures: None,
    })
    .expect("create should succeed")
}

#[test]
fn create_plant_stamps_images_and_starts_with_empty_histories() {
    let app = memory_app();
    let record = create(&app, "  ");
    assert!(record.id.starts_with("fiddle-leaf-fig-"));
    assert_eq!(record.location, "Unassigned");
    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].captured_at, record.created_at);
    assert!(record.watering_history.is_empty());
    assert!(record.fertilizing_history.is_empty());
    assert!(record.moisture_history.is_empty());
    assert_eq!(app.list_plants(), vec![record]);
}

#[test]
fn concurrent_creations_never_share_an_id() {
    let app = Arc::new(memory_app());
    let handles = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            std::thread::spawn(move || {
                (0..6)
                    .map(|_| create(&app, "Shelf").id)
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();
    let mut ids = handles
        .into_iter()
        .flat_map(|handle| handle.join().expect("worker should finish"))
        .collect::<Vec<_>>();

    assert_eq!(app.list_plants().len(), 48);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 48);
}

#[test]
fn create_plant_does_not_overwrite_an_unreadable_collection() {
    let raw = r#"{"schemaVersion": 7, "plants": []}"#;
    let app = App::with_backend(
        MemorySlots::new().with_value(crate::store::DEFAULT_SLOT_KEY, raw),
        &Settings::default(),
    );
    let err = app
        .create_plant(CreatePlant {
            images: vec!["data:image/jpeg;base64,AA".to_string()],
            analysis: sample_analysis(),
            location: "Shelf".to_string(),
            user_measures: None,
        })
        .expect_err("newer collection must be kept");
    assert!(matches!(err, AppError::Store(StoreError::NewerVersion(7))));
}

#[test]
fn create_plant_refuses_more_images_than_configured() {
    let app = memory_app();
    let err = app
        .create_plant(CreatePlant {
            images: vec!["a".to_string(); 4],
            analysis: sample_analysis(),
            location: String::new(),
            user_measures: None,
        })
        .expect_err("four images exceed the default limit");
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert!(app.list_plants().is_empty());
}

#[test]
fn encode_images_drops_undecodable_stills() {
    let app = memory_app();
    let encoded = app
        .encode_images(&[png_bytes(2048, 1024), b"not an image".to_vec()])
        .expect("batch within limit");
    assert_eq!(encoded.len(), 1);
    assert!(encoded[0].starts_with("data:image/jpeg;base64,"));

    let err = app
        .encode_images(&vec![png_bytes(4, 4); 4])
        .expect_err("too many captures");
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert!(matches!(
        app.encode_image(b"garbage"),
        Err(AppError::Codec(_))
    ));
}

#[test]
fn history_actions_go_through_the_store() {
    let app = memory_app();
    let id = create(&app, "Office").id;

    app.record_watering(&id, Some(datetime!(2024-03-01 08:00 UTC)))
        .expect("water");
    app.record_fertilizing(&id, Some(datetime!(2024-03-01 08:00 UTC)), Some(FertilizerKind::Stick))
        .expect("fertilize");
    let updated = app
        .record_moisture(&id, 6, Some(datetime!(2024-03-02 08:00 UTC)), None)
        .expect("moisture");
    assert_eq!(updated.health.substrate_moisture, Some(6));

    let timeline = app.timeline(&id).expect("timeline");
    let kinds: Vec<HistoryKind> = timeline.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![
            HistoryKind::Moisture,
            HistoryKind::Watering,
            HistoryKind::Fertilizing
        ]
    );

    let err = app
        .record_moisture(&id, 11, None, None)
        .expect_err("out of range");
    assert!(matches!(
        err,
        AppError::History(HistoryError::MoistureOutOfRange(11))
    ));
    assert_eq!(app.show_plant(&id).expect("show").moisture_history.len(), 1);
}

#[test]
fn delete_event_uses_native_index() {
    let app = memory_app();
    let id = create(&app, "Office").id;
    app.record_watering(&id, Some(datetime!(2024-01-01 00:00 UTC)))
        .expect("water");
    app.record_watering(&id, Some(datetime!(2024-02-01 00:00 UTC)))
        .expect("water");

    let newest = app.timeline(&id).expect("timeline")[0].clone();
    assert_eq!(newest.native_index, 1);
    let updated = app
        .delete_event(&id, newest.kind, newest.native_index)
        .expect("delete");
    assert_eq!(updated.watering_history, vec!["2024-01-01T00:00:00Z"]);

    let err = app
        .delete_event(&id, HistoryKind::Fertilizing, 0)
        .expect_err("nothing to delete");
    assert!(matches!(
        err,
        AppError::History(HistoryError::IndexOutOfRange { len: 0, .. })
    ));
}

#[test]
fn unknown_ids_are_not_found() {
    let app = memory_app();
    assert!(matches!(
        app.record_watering("ghost", None),
        Err(AppError::NotFound(id)) if id == "ghost"
    ));
    assert!(matches!(app.remove_plant("ghost"), Err(AppError::NotFound(_))));
    assert!(matches!(app.botanical_report("ghost"), Err(AppError::NotFound(_))));
}

#[test]
fn schedule_uses_frequency_and_fixed_fertilizing_interval() {
    let app = memory_app();
    let id = create(&app, "Office").id;
    let now = datetime!(2024-05-10 12:00 UTC);
    app.record_watering(&id, Some(datetime!(2024-05-05 09:00 UTC)))
        .expect("water");

    let schedule = app.care_schedule(&id, now).expect("schedule");
    assert_eq!(schedule.next_watering.as_deref(), Some("2024-05-14T09:00:00Z"));
    assert_eq!(schedule.watering_status, DueStatus::Upcoming);
    assert_eq!(schedule.next_fertilizing.as_deref(), Some("2024-05-10T12:00:00Z"));
    assert_eq!(schedule.fertilizing_status, DueStatus::DueToday);
    let overview = app.care_overview(now);
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].0.id, id);
    assert_eq!(overview[0].1, schedule);
}

#[test]
fn calendar_marks_event_days() {
    let app = memory_app();
    let id = create(&app, "Office").id;
    app.record_watering(&id, Some(datetime!(2024-02-14 18:00 UTC)))
        .expect("water");
    let month = app
        .calendar(&id, 2024, Month::February, date!(2024 - 02 - 20))
        .expect("calendar");
    assert_eq!(month.days.len(), 29);
    assert!(month.days[13].watered);
    assert!(month.days[19].today);
}

#[test]
fn location_and_measure_edits_merge() {
    let app = memory_app();
    let id = create(&app, "Office").id;

    let moved = app.set_location(&id, " Balcony ").expect("locate");
    assert_eq!(moved.location, "Balcony");
    assert_eq!(app.set_location(&id, "").expect("locate").location, "Unassigned");

    app.set_user_measures(
        &id,
        PlantMeasures {
            height_cm: Some(110.0),
            ..PlantMeasures::default()
        },
    )
    .expect("measure");
    let updated = app
        .set_user_measures(
            &id,
            PlantMeasures {
                pot_diameter_cm: Some(26.0),
                ..PlantMeasures::default()
            },
        )
        .expect("measure");
    let user = updated.user_measures.clone().expect("user measures");
    assert_eq!(user.height_cm, Some(110.0));
    assert_eq!(user.pot_diameter_cm, Some(26.0));
    let shown = updated.display_measures();
    assert_eq!(shown.height_cm, Some(110.0));
    assert_eq!(shown.pot_height_cm, Some(22.0));

    assert!(matches!(
        app.set_user_measures(&id, PlantMeasures::default()),
        Err(AppError::InvalidArgument(_))
    ));
    assert!(matches!(
        app.set_user_measures(
            &id,
            PlantMeasures {
                height_cm: Some(-3.0),
                ..PlantMeasures::default()
            }
        ),
        Err(AppError::InvalidArgument(_))
    ));
}

struct FixedReader(Result<u8, AnalysisError>);

impl MoistureReader for FixedReader {
    fn read_moisture(&self, _image: &str) -> Result<u8, AnalysisError> {
        self.0.clone()
    }
}

#[test]
fn quick_moisture_records_reading_with_source_image() {
    let app = memory_app();
    let id = create(&app, "Office").id;
    let updated = app
        .quick_moisture(&id, "data:image/jpeg;base64,BB", &FixedReader(Ok(14)))
        .expect("quick moisture");
    let entry = updated.moisture_history.last().expect("entry");
    assert_eq!(entry.value, 10);
    assert_eq!(entry.source_image.as_deref(), Some("data:image/jpeg;base64,BB"));

    let err = app
        .quick_moisture(&id, "img", &FixedReader(Err(AnalysisError::EmptyResponse)))
        .expect_err("collaborator failure");
    assert!(err.user_message().starts_with("analysis unavailable"));
    assert_eq!(app.show_plant(&id).expect("show").moisture_history.len(), 1);
}

struct StaticAnalyzer;

impl Analyzer for StaticAnalyzer {
    fn analyze(
        &self,
        _images: &[String],
        _current_pot_diameter_cm: Option<f64>,
    ) -> Result<AnalysisResult, AnalysisError> {
        Ok(sample_analysis())
    }
}

#[test]
fn analyze_requires_images_and_honours_cancellation() {
    let app = memory_app();
    let analyzer: Arc<dyn Analyzer> = Arc::new(StaticAnalyzer);
    let images = vec!["img".to_string()];

    let result = app
        .analyze(analyzer.clone(), &images, None, CancellationToken::new())
        .expect("analysis");
    assert_eq!(result.identification.scientific_name, "Ficus lyrata");

    assert!(matches!(
        app.analyze(analyzer.clone(), &[], None, CancellationToken::new()),
        Err(AppError::InvalidArgument(_))
    ));

    let token = CancellationToken::new();
    token.cancel();
    let err = app
        .analyze(analyzer, &images, None, token)
        .expect_err("cancelled");
    assert_eq!(err.user_message(), "analysis cancelled");
}

#[test]
fn remove_and_purge() {
    let app = memory_app();
    let first = create(&app, "Office").id;
    create(&app, "Kitchen");
    app.remove_plant(&first).expect("remove");
    assert_eq!(app.list_plants().len(), 1);
    app.purge().expect("purge");
    assert!(app.list_plants().is_empty());
}

#[test]
fn quota_failure_surfaces_distinct_message_and_keeps_data() {
    let app = App::with_backend(MemorySlots::with_capacity(12_000), &Settings::default());
    let id = create(&app, "Office").id;
    let err = app
        .create_plant(CreatePlant {
            images: vec![format!("data:image/jpeg;base64,{}", "A".repeat(20_000))],
            analysis: sample_analysis(),
            location: String::new(),
            user_measures: None,
        })
        .expect_err("quota should be exceeded");
    assert!(matches!(err, AppError::Store(StoreError::StorageQuotaExceeded)));
    assert_eq!(
        err.user_message(),
        "local storage is full; delete old plants to free space"
    );
    let plants = app.list_plants();
    assert_eq!(plants.len(), 1);
    assert_eq!(plants[0].id, id);
}

#[test]
fn open_creates_sqlite_store_on_disk() {
    let root = std::env::temp_dir().join(format!("botanica-app-test-{}", Uuid::now_v7()));
    let settings = Settings {
        db_path: root.join("nested/state.sqlite"),
        ..Settings::default()
    };
    let id = {
        let app = App::open(&settings).expect("app should open");
        create(&app, "Office").id
    };
    let reopened = App::open(&settings).expect("app should reopen");
    assert_eq!(reopened.show_plant(&id).expect("show").location, "Office");
    let _ = std::fs::remove_dir_all(root);
}
