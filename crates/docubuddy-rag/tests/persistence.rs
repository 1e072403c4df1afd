mod common;

use std::sync::Arc;

use common::*;
use docubuddy_rag::docubuddy_core::INDEX_FILE;
use docubuddy_rag::{Error, SessionState};

const QUESTION: &str = "What does the borrow checker enforce?";

#[tokio::test]
async fn test_save_load_round_trip_reproduces_retrieval() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    let bread = fx.write("bread.txt", BREAD_TEXT.as_bytes());
    fx.session.ingest(&[rust, bread], None).await.unwrap();

    let dir = fx.dir.path().join("saved");
    let manifest = fx.session.save(&dir).await.unwrap();
    assert_eq!(manifest.passages, 2);
    assert_eq!(manifest.dimensions, DIMS);
    assert_eq!(manifest.embedding_model.as_deref(), Some("hash-embed"));

    let before = fx.session.query(QUESTION).await.unwrap();
    let prompt_before = fx.llm.last_prompt();

    let llm = Arc::new(RecordingLlm::default());
    let restored = session_in(fx.dir.path(), DIMS, Arc::new(HashEmbedder::new(DIMS)), llm.clone());
    restored.load(&dir).await.unwrap();

    assert_eq!(restored.state().await, SessionState::Active);
    assert_eq!(restored.passage_count().await, 2);

    let after = restored.query(QUESTION).await.unwrap();
    assert_eq!(after.sources, before.sources);
    assert_eq!(llm.last_prompt(), prompt_before);
}

#[tokio::test]
async fn test_load_with_other_dimensions_fails_fast() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    fx.session.ingest(&[rust], Some("research")).await.unwrap();

    let other = session_in(
        fx.dir.path(),
        128,
        Arc::new(HashEmbedder::new(128)),
        Arc::new(RecordingLlm::default()),
    );
    let err = other.load_named("research").await.unwrap_err();

    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 128,
            found: DIMS
        }
    ));
    assert_eq!(other.state().await, SessionState::Ready);
}

#[tokio::test]
async fn test_load_with_other_embedding_model_fails() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    fx.session.ingest(&[rust], Some("research")).await.unwrap();

    let other = session_in(
        fx.dir.path(),
        DIMS,
        Arc::new(HashEmbedder::with_model(DIMS, "other-embed")),
        Arc::new(RecordingLlm::default()),
    );
    let err = other.load_named("research").await.unwrap_err();

    assert!(matches!(err, Error::EmbeddingModelMismatch { .. }));
}

#[tokio::test]
async fn test_missing_and_corrupt_storage() {
    let fx = Fixture::new();

    let err = fx.session.load(&fx.dir.path().join("nowhere")).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    let err = fx.session.load_named("nowhere").await.unwrap_err();
    assert!(matches!(err, Error::KnowledgeBaseNotFound(_)));

    fx.session.create_knowledge_base(Some("broken")).await.unwrap();
    let dir = fx.session.catalog().path_for("broken").unwrap();
    std::fs::write(dir.join(INDEX_FILE), b"definitely not an index").unwrap();

    let err = fx.session.load_named("broken").await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[tokio::test]
async fn test_failed_load_keeps_current_index() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    fx.session.ingest(&[rust], None).await.unwrap();

    assert!(fx.session.load(&fx.dir.path().join("nowhere")).await.is_err());
    assert_eq!(fx.session.passage_count().await, 1);
}

#[tokio::test]
async fn test_load_replaces_rather_than_merges() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    let bread = fx.write("bread.txt", BREAD_TEXT.as_bytes());

    fx.session.ingest(&[bread], Some("baking")).await.unwrap();
    fx.session.create_knowledge_base(None).await.unwrap();
    fx.session.ingest(&[rust.clone(), rust], None).await.unwrap();
    assert_eq!(fx.session.passage_count().await, 2);

    fx.session.load_named("baking").await.unwrap();
    assert_eq!(fx.session.passage_count().await, 1);
    assert_eq!(fx.session.active_knowledge_base().as_deref(), Some("baking"));
}

#[tokio::test]
async fn test_named_ingest_grows_stored_knowledge_base() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    let bread = fx.write("bread.txt", BREAD_TEXT.as_bytes());

    fx.session.ingest(&[rust], Some("notes")).await.unwrap();
    fx.session.ingest(&[bread], Some("notes")).await.unwrap();

    let infos = fx.session.list_knowledge_bases().unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].name, "notes");
    assert_eq!(infos[0].passages, Some(2));
    assert!(infos[0].size_bytes > 0);
}

#[tokio::test]
async fn test_active_knowledge_base_cannot_be_deleted() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());

    fx.session.ingest(&[rust], Some("keep")).await.unwrap();
    fx.session.create_knowledge_base(Some("scratch")).await.unwrap();
    assert_eq!(fx.session.active_knowledge_base().as_deref(), Some("scratch"));

    assert!(matches!(
        fx.session.delete_knowledge_base("scratch"),
        Err(Error::InvalidInput(_))
    ));

    fx.session.delete_knowledge_base("keep").unwrap();
    let names: Vec<_> = fx
        .session
        .list_knowledge_bases()
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["scratch"]);
}

#[tokio::test]
async fn test_save_before_anything_is_not_ready() {
    let fx = Fixture::new();
    let err = fx.session.save_named("empty").await.unwrap_err();
    assert!(matches!(err, Error::NotReady));
}

#[tokio::test]
async fn test_failed_save_leaves_index_untouched() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    let bread = fx.write("bread.txt", BREAD_TEXT.as_bytes());
    let root = fx.dir.path().join("knowledge_bases");

    // The catalog root is a plain file, so nothing can be saved under it
    std::fs::write(&root, b"not a directory").unwrap();

    let err = fx.session.ingest(&[rust.clone()], Some("notes")).await.unwrap_err();
    assert!(matches!(err, Error::Io(_) | Error::Storage(_)));
    assert_eq!(fx.session.state().await, SessionState::Ready);
    assert_eq!(fx.session.passage_count().await, 0);

    fx.session.ingest(&[bread], None).await.unwrap();
    assert!(fx.session.ingest(&[rust.clone()], Some("notes")).await.is_err());
    assert_eq!(fx.session.passage_count().await, 1);
    assert_eq!(fx.session.active_knowledge_base(), None);

    // A retry once storage works adds each passage exactly once
    std::fs::remove_file(&root).unwrap();
    fx.session.ingest(&[rust], Some("notes")).await.unwrap();
    assert_eq!(fx.session.passage_count().await, 1);
    assert_eq!(fx.session.list_knowledge_bases().unwrap()[0].passages, Some(1));
}

#[tokio::test]
async fn test_named_ingest_targets_that_knowledge_base() {
    let fx = Fixture::new();
    let rust = fx.write("rust.txt", RUST_TEXT.as_bytes());
    let bread = fx.write("bread.txt", BREAD_TEXT.as_bytes());

    fx.session.ingest(&[bread.clone()], Some("baking")).await.unwrap();
    fx.session.ingest(&[rust], Some("research")).await.unwrap();

    // "research" starts fresh instead of copying the loaded "baking"
    assert_eq!(fx.session.active_knowledge_base().as_deref(), Some("research"));
    assert_eq!(fx.session.passage_count().await, 1);

    // Growing a stored entry that is not active starts from its saved state
    fx.session.ingest(&[bread], Some("baking")).await.unwrap();
    assert_eq!(fx.session.active_knowledge_base().as_deref(), Some("baking"));
    assert_eq!(fx.session.passage_count().await, 2);

    let counts: Vec<_> = fx
        .session
        .list_knowledge_bases()
        .unwrap()
        .into_iter()
        .map(|i| (i.name, i.passages))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("baking".to_string(), Some(2)),
            ("research".to_string(), Some(1)),
        ]
    );
}
