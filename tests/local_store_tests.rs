// Integration tests for the filesystem memory store

use memory_journal::{
    FormDraft, LocalStore, MediaValue, OwnerId, Persistence, PersistenceError, RecordId,
    StorageConfig, Upload,
};
use tempfile::TempDir;

fn store(dir: &TempDir) -> LocalStore {
    LocalStore::new(StorageConfig {
        root: dir.path().to_path_buf(),
        bucket: "memories".to_string(),
        public_base_url: "http://localhost/media".to_string(),
    })
}

fn draft_with_upload() -> FormDraft {
    FormDraft {
        image: Some(MediaValue::Payload(Upload::new(
            "beach.png",
            "image/png",
            vec![0x89, 0x50, 0x4e, 0x47],
        ))),
        title: "Beach Trip".to_string(),
        description: "We walked along the shore for hours.".to_string(),
        audio: Some(MediaValue::Payload(Upload::new(
            "audio.webm",
            "audio/webm",
            vec![1, 2, 3],
        ))),
        record_id: None,
    }
}

#[tokio::test]
async fn test_create_uploads_payloads_under_owner() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);
    let owner = OwnerId::new("u-1");

    let id = store.create_or_update(&draft_with_upload(), &owner).await?;
    let record = store.get(&id).await?;

    assert_eq!(record.title, "Beach Trip");
    assert_eq!(record.user_id, owner);
    assert!(record
        .image
        .starts_with("http://localhost/media/memories/u-1/images/"));
    assert!(record.image.ends_with("_beach.png"));

    let audio = record.audio.expect("audio should be stored");
    assert!(audio.starts_with("http://localhost/media/memories/u-1/audio/"));

    // The URL maps onto a file inside the bucket directory
    let object = record
        .image
        .trim_start_matches("http://localhost/media/memories/");
    let bytes = tokio::fs::read(store.bucket_dir().join(object)).await?;
    assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);

    Ok(())
}

#[tokio::test]
async fn test_references_are_stored_as_is() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);

    let draft = FormDraft {
        image: Some(MediaValue::reference("https://cdn/x.png")),
        audio: None,
        ..draft_with_upload()
    };
    let id = store.create_or_update(&draft, &OwnerId::new("u-1")).await?;
    let record = store.get(&id).await?;

    assert_eq!(record.image, "https://cdn/x.png");
    assert_eq!(record.audio, None);

    Ok(())
}

#[tokio::test]
async fn test_update_rewrites_existing_record() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);
    let owner = OwnerId::new("u-1");

    let id = store.create_or_update(&draft_with_upload(), &owner).await?;
    let created = store.get(&id).await?;

    let mut edit = FormDraft::from_record(&created);
    edit.title = "Beach Day".to_string();
    edit.audio = None;

    let updated_id = store.create_or_update(&edit, &owner).await?;
    assert_eq!(updated_id, id);

    let updated = store.get(&id).await?;
    assert_eq!(updated.title, "Beach Day");
    assert_eq!(updated.image, created.image);
    assert_eq!(updated.audio, None);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    assert_eq!(store.list_for_owner(&owner).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_update_of_unknown_record_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);

    let draft = FormDraft {
        record_id: Some(RecordId("missing".to_string())),
        ..draft_with_upload()
    };
    let result = store.create_or_update(&draft, &OwnerId::new("u-1")).await;

    assert!(matches!(result, Err(PersistenceError::NotFound(id)) if id == "missing"));
    Ok(())
}

#[tokio::test]
async fn test_blank_owner_is_refused() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);

    let result = store
        .create_or_update(&draft_with_upload(), &OwnerId::new(" "))
        .await;

    assert!(matches!(result, Err(PersistenceError::MissingOwner)));
    assert!(!store.bucket_dir().exists(), "nothing uploaded");
    Ok(())
}

#[tokio::test]
async fn test_list_for_owner_filters_and_sorts_newest_first() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);
    let alice = OwnerId::new("u-1");
    let bob = OwnerId::new("u-2");

    let first = store.create_or_update(&draft_with_upload(), &alice).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.create_or_update(&draft_with_upload(), &bob).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let third = store.create_or_update(&draft_with_upload(), &alice).await?;

    let ids: Vec<RecordId> = store
        .list_for_owner(&alice)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(ids, vec![third, first]);
    assert!(store.list_for_owner(&OwnerId::new("u-3")).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_unknown_record_is_not_found() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);

    let result = store.get(&RecordId("nope".to_string())).await;
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_update_for_another_owner_is_refused() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);

    let id = store
        .create_or_update(&draft_with_upload(), &OwnerId::new("u-1"))
        .await?;
    let created = store.get(&id).await?;

    // New payloads would otherwise land under the other owner's prefix
    let mut edit = draft_with_upload();
    edit.record_id = Some(id.clone());
    let result = store.create_or_update(&edit, &OwnerId::new("u-2")).await;

    assert!(matches!(result, Err(PersistenceError::OwnerMismatch { .. })));
    assert_eq!(store.get(&id).await?, created);
    assert!(!store.bucket_dir().join("u-2").exists());

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_only_that_record() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);
    let owner = OwnerId::new("u-1");

    let keep = store.create_or_update(&draft_with_upload(), &owner).await?;
    let gone = store.create_or_update(&draft_with_upload(), &owner).await?;

    let removed = store.delete(&gone).await?;
    assert_eq!(removed.id, gone);

    let ids: Vec<RecordId> = store
        .list_for_owner(&owner)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![keep]);
    assert!(matches!(
        store.get(&gone).await,
        Err(PersistenceError::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_record_is_not_found() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store(&dir);

    let result = store.delete(&RecordId("nope".to_string())).await;
    assert!(matches!(result, Err(PersistenceError::NotFound(id)) if id == "nope"));

    Ok(())
}
