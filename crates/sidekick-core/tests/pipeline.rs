//! End-to-end properties of the retrieval-and-synthesis pipeline, driven
//! through the public API with the hashing embedder and a scripted
//! completion model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sidekick_core::answer::Orchestrator;
use sidekick_core::chunk::chunk_text;
use sidekick_core::completion::{Completer, Completion, CompletionParams};
use sidekick_core::embedding::{Embedder, HashingEmbedder};
use sidekick_core::index::EmbeddingIndex;
use sidekick_core::models::{ChunkUnit, ChunkingConfig, Document, Reference};
use sidekick_core::retrieve::Retriever;
use sidekick_core::store::memory::InMemoryStore;
use sidekick_core::store::IndexStore;
use sidekick_core::{Error, Result};

// ─── Test collaborators ─────────────────────────────────────────────

struct ScriptedCompleter {
    reply: String,
    calls: Mutex<usize>,
}

impl ScriptedCompleter {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str, _params: &CompletionParams) -> Result<Completion> {
        *self.calls.lock().unwrap() += 1;
        Ok(Completion {
            text: self.reply.clone(),
        })
    }
}

fn sky_document() -> Document {
    Document {
        path: "a.md".to_string(),
        title: "A".to_string(),
        text: "The sky is blue. ".repeat(50),
    }
}

fn window(unit: ChunkUnit) -> ChunkingConfig {
    ChunkingConfig {
        window_size: 256,
        overlap: 32,
        unit,
    }
}

// ─── Chunker ────────────────────────────────────────────────────────

#[test]
fn test_text_within_window_is_single_chunk() {
    for len in [0usize, 1, 17, 256] {
        let text = "x".repeat(len);
        let chunks = chunk_text(&text, &window(ChunkUnit::Chars)).unwrap();
        assert_eq!(chunks, vec![text.clone()], "length {}", len);
    }
}

#[test]
fn test_overlap_at_or_above_window_rejected() {
    for (w, o) in [(1, 1), (4, 4), (4, 9), (256, 256)] {
        let cfg = ChunkingConfig {
            window_size: w,
            overlap: o,
            unit: ChunkUnit::Chars,
        };
        assert!(
            matches!(chunk_text("text", &cfg), Err(Error::InvalidConfiguration(_))),
            "W={} O={}",
            w,
            o
        );
    }
}

#[test]
fn test_chunking_is_deterministic() {
    let text = sky_document().text;
    for unit in [ChunkUnit::Chars, ChunkUnit::Words] {
        let cfg = ChunkingConfig {
            window_size: 20,
            overlap: 5,
            unit,
        };
        assert_eq!(chunk_text(&text, &cfg).unwrap(), chunk_text(&text, &cfg).unwrap());
    }
}

// ─── Index + retrieval ──────────────────────────────────────────────

#[tokio::test]
async fn test_search_with_fewer_chunks_than_top_n() {
    let e = HashingEmbedder::new(128);
    let docs = vec![
        Document {
            path: "one.md".to_string(),
            title: "One".to_string(),
            text: "rust borrow checker".to_string(),
        },
        Document {
            path: "two.md".to_string(),
            title: "Two".to_string(),
            text: "python garbage collector".to_string(),
        },
    ];
    let index = EmbeddingIndex::build(&docs, ChunkingConfig::default(), &e, 8)
        .await
        .unwrap();

    let results = index.search(&e, "borrow checker", 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source_path, "one.md");
    assert!(results[0].score >= results[1].score);
}

#[tokio::test]
async fn test_empty_index_search_returns_empty() {
    let e = HashingEmbedder::new(32);
    let index = EmbeddingIndex::build(&[], ChunkingConfig::default(), &e, 8)
        .await
        .unwrap();
    assert!(index.is_empty());
    let results = index.search(&e, "anything at all", 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_unrelated_documents_still_ranked() {
    let e = HashingEmbedder::new(128);
    let docs = vec![
        Document {
            path: "cats.md".to_string(),
            title: "Cats".to_string(),
            text: "felines purr loudly".to_string(),
        },
        Document {
            path: "trains.md".to_string(),
            title: "Trains".to_string(),
            text: "locomotives haul freight".to_string(),
        },
    ];
    let index = EmbeddingIndex::build(&docs, ChunkingConfig::default(), &e, 8)
        .await
        .unwrap();
    let results = index.search(&e, "quantum chromodynamics", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].score >= results[1].score);
}

#[tokio::test]
async fn test_concurrent_searches_on_shared_index() {
    let e: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(64));
    let index = Arc::new(
        EmbeddingIndex::build(&[sky_document()], window(ChunkUnit::Chars), e.as_ref(), 16)
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let index = index.clone();
        let e = e.clone();
        handles.push(tokio::spawn(async move {
            index.search(e.as_ref(), "What color is the sky?", 3).await
        }));
    }
    let mut outcomes = Vec::new();
    for h in handles {
        outcomes.push(h.await.unwrap().unwrap());
    }
    for o in &outcomes[1..] {
        assert_eq!(o, &outcomes[0]);
    }
}

#[tokio::test]
async fn test_store_round_trip_preserves_search() {
    let e = HashingEmbedder::new(64);
    let index = EmbeddingIndex::build(&[sky_document()], window(ChunkUnit::Chars), &e, 16)
        .await
        .unwrap();
    let store = InMemoryStore::new();
    let path = Path::new("index.sqlite");
    store.save(path, &index).await.unwrap();

    let loaded = store.load(path).await.unwrap();
    assert_eq!(
        loaded.search(&e, "sky", 3).await.unwrap(),
        index.search(&e, "sky", 3).await.unwrap()
    );
}

// ─── Orchestrator ───────────────────────────────────────────────────

#[tokio::test]
async fn test_sky_document_end_to_end() {
    for unit in [ChunkUnit::Chars, ChunkUnit::Words] {
        let e: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(384));
        let index = EmbeddingIndex::build(&[sky_document()], window(unit), e.as_ref(), 64)
            .await
            .unwrap();
        let retriever = Retriever::new(Arc::new(index), e);

        let results = retriever.retrieve("What color is the sky?").await.unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.source_path == "a.md"));

        let completer = Arc::new(ScriptedCompleter::new("The sky is blue."));
        let orchestrator = Orchestrator::new(retriever, completer.clone());
        let answer = orchestrator.answer("What color is the sky?").await.unwrap();

        assert_eq!(answer.text, "The sky is blue.");
        assert_eq!(
            answer.references,
            vec![Reference {
                path: "a.md".to_string(),
                title: "A".to_string(),
            }]
        );
        assert_eq!(*completer.calls.lock().unwrap(), 1);
    }
}

#[tokio::test]
async fn test_empty_index_answer_has_no_references() {
    let e: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(32));
    let index = EmbeddingIndex::build(&[], ChunkingConfig::default(), e.as_ref(), 8)
        .await
        .unwrap();
    let orchestrator = Orchestrator::new(
        Retriever::new(Arc::new(index), e),
        Arc::new(ScriptedCompleter::new("I don't know.")),
    );
    let answer = orchestrator.answer("Anything?").await.unwrap();
    assert!(answer.references.is_empty());
}

#[test]
fn test_document_parses_from_jsonl_line() {
    let doc: Document =
        serde_json::from_str(r#"{"path": "a.md", "title": "A", "text": "body"}"#).unwrap();
    assert_eq!(doc.path, "a.md");
    assert_eq!(doc.title, "A");
    assert_eq!(doc.text, "body");
}
