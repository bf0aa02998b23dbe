//! Shared fakes for pipeline integration tests.
//!
//! Every collaborator trait gets an in-memory implementation so the
//! scenarios exercise real workers, the real bus, and the real capture
//! loop with no network or database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storymill_cloud::{ObjectStore, SecretStore};
use storymill_core::PipelineError;
use storymill_db::models::character::Character;
use storymill_db::models::scene::Scene;
use storymill_db::models::story::Story;
use storymill_db::{MemoryRecordStore, RecordStore};
use storymill_events::StoryGenerated;
use storymill_genai::{ImageGenerator, SpeechSynthesizer, TextGenerator};
use storymill_pipeline::NotificationChannel;

/// Eight-byte PNG signature; enough for header-only format sniffing.
pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub struct FakeSecrets;

#[async_trait]
impl SecretStore for FakeSecrets {
    async fn get_secret(&self, _name: &str) -> Result<String, PipelineError> {
        Ok("sk-test".to_string())
    }
}

/// Object store that records every put.
#[derive(Default)]
pub struct FakeObjectStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    pub put_count: AtomicU32,
}

impl FakeObjectStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, ttl_secs: u64) -> Result<String, PipelineError> {
        Ok(format!("https://signed.example/{key}?ttl={ttl_secs}"))
    }
}

/// Object store whose puts always fail.
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put(&self, _: &str, _: Vec<u8>, _: &str) -> Result<(), PipelineError> {
        Err(PipelineError::UpstreamUnavailable("bucket offline".into()))
    }

    async fn presigned_get_url(&self, _: &str, _: u64) -> Result<String, PipelineError> {
        Err(PipelineError::UpstreamUnavailable("bucket offline".into()))
    }
}

pub struct FakeText {
    pub completion: String,
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn complete(
        &self,
        _api_key: &str,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, PipelineError> {
        Ok(self.completion.clone())
    }
}

pub struct FakeImages;

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(
        &self,
        _api_key: &str,
        _prompt: &str,
        _size: &str,
    ) -> Result<String, PipelineError> {
        Ok("https://img.example/generated.png".to_string())
    }

    async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, PipelineError> {
        Ok(PNG_MAGIC.to_vec())
    }
}

/// Image capability that always errors, for permanent-failure scenarios.
pub struct FailingImages;

#[async_trait]
impl ImageGenerator for FailingImages {
    async fn generate_image(
        &self,
        _api_key: &str,
        _prompt: &str,
        _size: &str,
    ) -> Result<String, PipelineError> {
        Err(PipelineError::UpstreamUnavailable(
            "image provider down".into(),
        ))
    }

    async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, PipelineError> {
        Err(PipelineError::UpstreamUnavailable(
            "image provider down".into(),
        ))
    }
}

pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _sample_rate: u32,
    ) -> Result<Vec<u8>, PipelineError> {
        Ok(vec![0xFF, 0xFB, 0x90, 0x00])
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, message: &str) -> Result<(), PipelineError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// A memory store seeded with the reference scenario: two characters and
/// one scene.
pub async fn seeded_store() -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::new());
    for name in ["Ana", "Leo"] {
        store
            .upsert_character(&Character {
                id: name.to_lowercase(),
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap();
    }
    store
        .upsert_scene(&Scene {
            id: "forest".to_string(),
            description: "a quiet forest".to_string(),
        })
        .await
        .unwrap();
    store
}

/// Insert a ready-made story and return the matching domain event.
pub async fn inserted_story(store: &Arc<MemoryRecordStore>) -> (Story, StoryGenerated) {
    let story = Story::new(
        "The Quiet Forest".to_string(),
        "Once upon a time...".to_string(),
        vec![],
        "a quiet forest".to_string(),
        chrono::Utc::now() + chrono::Duration::days(2),
    );
    store.insert_story(&story).await.unwrap();

    let event = StoryGenerated {
        id: story.id.clone(),
        title: story.title.clone(),
        description: story.description.clone(),
        scene: story.scene.clone(),
    };
    (story, event)
}
