use resources::persistence::RecordPersistence;
use resources::{
    Content, ContentWrite, Guest, Owner, PendingUpload, Resource, ResourceError,
};

use crate::common::{NOW, TestStore};

mod save {
    use super::*;

    #[tokio::test]
    async fn raw_content_end_to_end() {
        let t = TestStore::spawn().await;
        let mut res = Resource::for_owner(Owner::new("User", 42, "avatar"), "pic.png");
        res.set_content("ABC");

        let outcome = t.store.save(&mut res, &Guest).await.unwrap();
        assert!(outcome.content_saved());

        let expected = t.root.join("User").join("42").join("avatar").join("pic.png");
        assert_eq!(res.path(), Some(expected.to_string_lossy().as_ref()));
        assert_eq!(std::fs::read(&expected).unwrap(), b"ABC");
        assert_eq!(res.size, Some(3));

        let row = t.persistence.find(outcome.id).await.unwrap().unwrap();
        assert_eq!(row.owner_model, "User");
        assert_eq!(row.owner_id, 42);
        assert_eq!(row.owner_attribute, "avatar");
        assert_eq!(row.size, 3);
        assert_eq!(row.time_added, NOW);
        assert_eq!(row.mime_type, "image/png");
        assert_eq!(row.user_id, None);

        assert!(t.store.delete(&res).await.unwrap());
        assert!(!expected.exists());
        assert!(t.persistence.find(outcome.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_upload_end_to_end() {
        let t = TestStore::spawn().await;
        let temp = t.upload_file("report", b"%PDF-1.7 quarterly numbers");

        let upload = PendingUpload::from_path(&temp, "report.pdf").await.unwrap();
        let mut res = Resource::from_pending_upload(upload);
        res.owner = Owner::new("Post", 7, "attachments");
        res.description = Some("Q3 report".into());

        let outcome = t.store.save(&mut res, &Some(3)).await.unwrap();
        assert!(matches!(outcome.content, ContentWrite::Written { bytes: 26 }));
        assert!(!temp.exists());

        let mut loaded = t.store.find(outcome.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "report.pdf");
        assert_eq!(loaded.mime_type, "application/pdf");
        assert_eq!(loaded.size, Some(26));
        assert_eq!(loaded.user_id, Some(3));
        assert_eq!(loaded.description.as_deref(), Some("Q3 report"));
        assert_eq!(
            t.store.read_content(&mut loaded).await.unwrap(),
            b"%PDF-1.7 quarterly numbers"
        );
    }

    #[tokio::test]
    async fn replacing_content_of_saved_resource_keeps_path() {
        let t = TestStore::spawn().await;
        let mut res = Resource::for_owner(Owner::new("User", 1, "avatar"), "me.png");
        res.set_content("old");
        let id = t.store.save(&mut res, &Guest).await.unwrap().id;

        let mut loaded = t.store.find(id).await.unwrap().unwrap();
        let temp = t.upload_file("new", b"brand new avatar");
        loaded.set_content(PendingUpload::new(&temp, "new.png", 16, "image/png"));
        t.store.save(&mut loaded, &Guest).await.unwrap();

        assert_eq!(loaded.path(), res.path());
        assert_eq!(loaded.name, "new.png");
        assert!(matches!(loaded.content_state(), Content::Unset));
        assert_eq!(
            std::fs::read(loaded.full_path().unwrap()).unwrap(),
            b"brand new avatar"
        );

        let row = t.persistence.find(id).await.unwrap().unwrap();
        assert_eq!(row.size, 16);
        assert_eq!(row.time_added, NOW);
    }

    #[tokio::test]
    async fn same_slot_and_name_share_a_file() {
        let t = TestStore::spawn().await;
        let owner = Owner::new("User", 5, "avatar");

        let mut first = Resource::for_owner(owner.clone(), "pic.png");
        first.set_content("first");
        t.store.save(&mut first, &Guest).await.unwrap();

        let mut second = Resource::for_owner(owner.clone(), "pic.png");
        second.set_content("second");
        t.store.save(&mut second, &Guest).await.unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.path(), second.path());

        let mut reloaded = t.store.find(first.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(t.store.read_content(&mut reloaded).await.unwrap(), b"second");
        assert_eq!(t.store.find_by_owner(&owner).await.unwrap().len(), 2);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_by_id_removes_row_and_file() {
        let t = TestStore::spawn().await;
        let mut res = Resource::for_owner(Owner::new("Post", 2, "files"), "notes.txt");
        res.set_content("some notes");
        let id = t.store.save(&mut res, &Guest).await.unwrap().id;
        let path = res.full_path().unwrap().to_path_buf();

        assert!(t.store.delete_by_id(id).await.unwrap());
        assert!(!path.exists());
        assert!(t.store.find(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let t = TestStore::spawn().await;
        let mut res = Resource::for_owner(Owner::new("Post", 2, "files"), "notes.txt");
        res.set_content("some notes");
        let id = t.store.save(&mut res, &Guest).await.unwrap().id;
        std::fs::remove_file(res.full_path().unwrap()).unwrap();

        assert!(!t.store.delete(&res).await.unwrap());
        assert!(t.persistence.find(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reading_after_file_loss_is_unavailable() {
        let t = TestStore::spawn().await;
        let mut res = Resource::for_owner(Owner::new("Post", 2, "files"), "lost.txt");
        res.set_content("soon gone");
        let id = t.store.save(&mut res, &Guest).await.unwrap().id;
        std::fs::remove_file(res.full_path().unwrap()).unwrap();

        let mut loaded = t.store.find(id).await.unwrap().unwrap();
        assert!(matches!(
            t.store.read_content(&mut loaded).await,
            Err(ResourceError::ContentUnavailable)
        ));
    }
}
