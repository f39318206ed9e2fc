//! Tests for the image indexer

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;

use crate::embeddings::{EmbeddingError, EmbeddingResult};
use crate::vector::{payload_fields, MemoryStore, ScoredPoint, VectorResult};

const DIM: usize = 4;

/// Embeds an image as its average colour plus a constant
struct ColourEncoder;

#[async_trait]
impl ImageEncoder for ColourEncoder {
    async fn embed_image_bytes(&self, data: Vec<u8>) -> EmbeddingResult<Vec<f32>> {
        let image = image::load_from_memory(&data).map_err(|e| {
            EmbeddingError::ImageProcessingFailed {
                reason: e.to_string(),
            }
        })?;
        let rgb = image.to_rgb8();
        let count = (rgb.width() * rgb.height()).max(1) as f32;
        let mut sums = [0.0f32; 3];
        for pixel in rgb.pixels() {
            for c in 0..3 {
                sums[c] += pixel[c] as f32 / 255.0;
            }
        }
        Ok(vec![sums[0] / count, sums[1] / count, sums[2] / count, 1.0])
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Fails as if the model files were missing
struct MissingModelEncoder;

#[async_trait]
impl ImageEncoder for MissingModelEncoder {
    async fn embed_image_bytes(&self, _data: Vec<u8>) -> EmbeddingResult<Vec<f32>> {
        Err(EmbeddingError::ModelNotFound {
            path: "models/vision.onnx".to_string(),
        })
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Counts upsert calls before delegating to a memory store
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    upserts: AtomicUsize,
}

#[async_trait]
impl VectorBackend for CountingStore {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn ensure_collection(&self, config: &CollectionConfig) -> VectorResult<bool> {
        self.inner.ensure_collection(config).await
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> VectorResult<usize> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(collection, points).await
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> VectorResult<Vec<ScoredPoint>> {
        self.inner.search(collection, query, limit).await
    }
}

fn collection() -> CollectionConfig {
    CollectionConfig::default()
        .with_name("listing_photos")
        .with_vector_size(DIM as u64)
}

fn write_png(path: &Path, colour: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb(colour)))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// red.png, rooms/blue.PNG, rooms/upstairs/green.jpeg (PNG data), broken.jpg, notes.txt
fn image_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("red.png"), [255, 0, 0]);
    write_png(&dir.path().join("rooms").join("blue.PNG"), [0, 0, 255]);
    write_png(
        &dir.path().join("rooms").join("upstairs").join("green.jpeg"),
        [0, 255, 0],
    );
    std::fs::write(dir.path().join("broken.jpg"), b"not really a jpeg").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"floor plan notes").unwrap();
    dir
}

fn indexer(
    encoder: Arc<dyn ImageEncoder>,
    store: Arc<CountingStore>,
    batch_size: usize,
) -> ImageIndexer {
    ImageIndexer::new(
        encoder,
        store,
        collection(),
        IndexerConfig {
            batch_size,
            ..IndexerConfig::default()
        },
    )
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_default_config() {
    let config = IndexerConfig::default();
    assert_eq!(config.batch_size, 32);
    assert!(config.extensions.contains(&"jpg".to_string()));
    assert!(config.extensions.contains(&"webp".to_string()));
}

#[test]
fn test_discover_finds_nested_and_uppercase() {
    let dir = image_tree();
    let indexer = indexer(Arc::new(ColourEncoder), Arc::new(CountingStore::default()), 32);

    let found = indexer.discover(dir.path()).unwrap();
    let names: Vec<String> = found.iter().map(|p| get_filename(p)).collect();

    assert_eq!(found.len(), 4);
    assert!(names.contains(&"red.png".to_string()));
    assert!(names.contains(&"blue.PNG".to_string()));
    assert!(names.contains(&"green.jpeg".to_string()));
    assert!(names.contains(&"broken.jpg".to_string()));
    assert!(!names.contains(&"notes.txt".to_string()));

    let mut sorted = found.clone();
    sorted.sort();
    assert_eq!(found, sorted);
}

#[test]
fn test_discover_with_trailing_slash() {
    let dir = image_tree();
    let indexer = indexer(Arc::new(ColourEncoder), Arc::new(CountingStore::default()), 32);

    let root = format!("{}/", dir.path().display());
    let found = indexer.discover(Path::new(&root)).unwrap();
    assert_eq!(found.len(), 4);
}

#[test]
fn test_discover_rejects_missing_root() {
    let dir = TempDir::new().unwrap();
    let indexer = indexer(Arc::new(ColourEncoder), Arc::new(CountingStore::default()), 32);

    let result = indexer.discover(&dir.path().join("absent"));
    assert!(matches!(result, Err(IndexerError::InvalidRoot { .. })));
}

// ============================================================================
// Runs
// ============================================================================

#[tokio::test]
async fn test_run_indexes_and_skips_broken_images() {
    let dir = image_tree();
    let store = Arc::new(CountingStore::default());
    let indexer = indexer(Arc::new(ColourEncoder), store.clone(), 32);

    let report = indexer.run(dir.path()).await.unwrap();

    assert!(report.collection_created);
    assert_eq!(report.discovered, 4);
    assert_eq!(report.indexed, 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(get_filename(&report.skipped[0].path), "broken.jpg");
    assert_eq!(store.inner.count("listing_photos").await.unwrap(), 3);

    // Red image is the closest match for a red query
    let hits = store
        .search("listing_photos", &[1.0, 0.0, 0.0, 1.0], 1)
        .await
        .unwrap();
    let payload = &hits[0].payload;
    assert_eq!(payload[payload_fields::FILE_NAME], "red.png");
    assert!(hits[0].path().unwrap().ends_with("red.png"));
    assert!(payload.contains_key(payload_fields::INDEXED_AT));
}

#[tokio::test]
async fn test_rerun_overwrites_points() {
    let dir = image_tree();
    let store = Arc::new(CountingStore::default());
    let indexer = indexer(Arc::new(ColourEncoder), store.clone(), 32);

    indexer.run(dir.path()).await.unwrap();
    let second = indexer.run(dir.path()).await.unwrap();

    assert!(!second.collection_created);
    assert_eq!(second.indexed, 3);
    assert_eq!(store.inner.count("listing_photos").await.unwrap(), 3);
}

#[tokio::test]
async fn test_run_upserts_in_batches() {
    let dir = image_tree();
    let store = Arc::new(CountingStore::default());
    let indexer = indexer(Arc::new(ColourEncoder), store.clone(), 2);

    let report = indexer.run(dir.path()).await.unwrap();

    assert_eq!(report.indexed, 3);
    assert_eq!(store.upserts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_model_failure_aborts_run() {
    let dir = image_tree();
    let store = Arc::new(CountingStore::default());
    let indexer = indexer(Arc::new(MissingModelEncoder), store.clone(), 32);

    let result = indexer.run(dir.path()).await;
    assert!(matches!(
        result,
        Err(IndexerError::Embedding(EmbeddingError::ModelNotFound { .. }))
    ));
    assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dimension_mismatch_aborts_run() {
    let dir = image_tree();
    let store = Arc::new(CountingStore::default());
    let indexer = ImageIndexer::new(
        Arc::new(ColourEncoder),
        store,
        collection().with_vector_size(8),
        IndexerConfig::default(),
    );

    let result = indexer.run(dir.path()).await;
    assert!(matches!(
        result,
        Err(IndexerError::DimensionMismatch {
            expected: 8,
            actual: 4
        })
    ));
}

#[test]
fn test_only_image_errors_become_skips() {
    let skip = IndexerError::Image {
        path: PathBuf::from("a.jpg"),
        reason: "bad".to_string(),
    };
    assert_eq!(
        skip.into_skipped().unwrap(),
        SkippedImage {
            path: PathBuf::from("a.jpg"),
            reason: "bad".to_string(),
        }
    );

    let abort = IndexerError::InvalidRoot {
        path: PathBuf::from("nowhere"),
    };
    assert!(matches!(
        abort.into_skipped(),
        Err(IndexerError::InvalidRoot { .. })
    ));
}
