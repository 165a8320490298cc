//! Deep and shallow subtree removal

mod common;

use arbor_json::{Document, Error, MemoryQuota, RemoveMode, Removed, Scalar, path};
use common::{CATALOG, catalog, quota_document};

mod deep {
    use super::*;

    #[test]
    fn test_moves_subtree_into_new_document() {
        let mut doc = catalog();
        let item = doc.remove_deep(None, &path!["items", 0]).unwrap().unwrap();

        assert_eq!(
            item.serialize(None).unwrap(),
            r#"{"sku":"A-1","price":10,"tags":["new","sale"]}"#
        );
        let items = doc.find(None, &path!["items"]).unwrap();
        assert_eq!(doc.size(items).unwrap(), 2);
        let first = doc.find(None, &path!["items", 0, "sku"]).unwrap();
        assert_eq!(doc.value(first).unwrap(), Scalar::String("B-2".into()));
    }

    #[test]
    fn test_handles_inside_subtree_are_forgotten() {
        let mut doc = catalog();
        let tags = doc.find(None, &path!["items", 0, "tags"]).unwrap().unwrap();
        let tag = doc.find(Some(tags), &path![1]).unwrap().unwrap();
        let registered = doc.stats().registered_handles;

        let moved = doc.remove_deep(None, &path!["items"]).unwrap().unwrap();
        assert!(!doc.is_valid(tags));
        assert!(!doc.is_valid(tag));
        assert!(doc.stats().registered_handles < registered);
        assert!(!moved.is_valid(tag));
    }

    #[test]
    fn test_relative_to_handle() {
        let mut doc = catalog();
        let address = doc.find(None, &path!["address"]).unwrap();
        let zip = doc.remove_deep(address, &path!["zip"]).unwrap().unwrap();
        assert_eq!(zip.value(None).unwrap(), Scalar::String("0150".into()));
        assert_eq!(doc.serialize(address).unwrap(), r#"{"city":"Oslo"}"#);
    }

    #[test]
    fn test_result_outlives_source() {
        let mut doc = Document::new();
        doc.parse_in_place(CATALOG.as_bytes(), true).unwrap();
        let address = doc.remove_deep(None, &path!["address"]).unwrap().unwrap();
        drop(doc);

        let city = address.find(None, &path!["city"]).unwrap();
        assert_eq!(address.value(city).unwrap(), Scalar::String("Oslo".into()));
    }

    #[test]
    fn test_extracted_document_is_a_full_document() {
        let mut doc = catalog();
        let mut items = doc.remove_deep(None, &path!["items"]).unwrap().unwrap();
        let tags = items.remove_deep(None, &path![0, "tags"]).unwrap().unwrap();
        assert_eq!(tags.serialize(None).unwrap(), r#"["new","sale"]"#);

        items.parse("[true]", true).unwrap();
        assert_eq!(items.serialize(None).unwrap(), "[true]");
    }

    #[test]
    fn test_inherits_configuration_and_quota() {
        let quota = MemoryQuota::new(1 << 20);
        let mut doc = quota_document(&quota);
        doc.parse(CATALOG, true).unwrap();
        let moved = doc.remove_deep(None, &path!["items"]).unwrap().unwrap();
        assert!(moved.config().quota.is_some());

        drop(doc);
        assert!(quota.used() > 0);
        drop(moved);
        assert_eq!(quota.used(), 0);
    }

    #[test]
    fn test_quota_failure_leaves_source_intact() {
        let probe = MemoryQuota::new(1 << 20);
        let mut sized = quota_document(&probe);
        sized.parse(CATALOG, true).unwrap();

        // room for the source, not for a copy of the items array
        let tight = MemoryQuota::new(probe.used() + 64);
        let mut doc = quota_document(&tight);
        doc.parse(CATALOG, true).unwrap();
        let before = doc.serialize(None).unwrap();
        let items = doc.find(None, &path!["items"]).unwrap().unwrap();

        let err = doc.remove_deep(None, &path!["items"]).unwrap_err();
        assert!(matches!(err, Error::MemoryExhausted(_)));
        assert_eq!(doc.serialize(None).unwrap(), before);
        assert!(doc.is_valid(items));
        assert_eq!(tight.used(), probe.used());
    }
}

mod shallow {
    use super::*;

    #[test]
    fn test_orphan_stays_readable() {
        let mut doc = catalog();
        let orphan = doc.remove_shallow(None, &path!["address"]).unwrap().unwrap();
        assert!(doc.find(None, &path!["address"]).unwrap().is_none());
        assert_eq!(doc.serialize(Some(orphan)).unwrap(), r#"{"city":"Oslo","zip":"0150"}"#);

        let city = doc.find(Some(orphan), &path!["city"]).unwrap();
        assert_eq!(doc.value(city).unwrap(), Scalar::String("Oslo".into()));
    }

    #[test]
    fn test_existing_handles_inside_orphan_stay_valid() {
        let mut doc = catalog();
        let zip = doc.find(None, &path!["address", "zip"]).unwrap().unwrap();
        doc.remove_shallow(None, &path!["address"]).unwrap().unwrap();
        assert!(doc.is_valid(zip));
        assert_eq!(doc.value(Some(zip)).unwrap(), Scalar::String("0150".into()));
    }

    #[test]
    fn test_orphans_released_on_teardown() {
        let mut doc = catalog();
        let a = doc.remove_shallow(None, &path!["address"]).unwrap().unwrap();
        let b = doc.remove_shallow(None, &path!["items", 1]).unwrap().unwrap();
        assert_eq!(doc.stats().pending_orphans, 2);
        assert_eq!(doc.stats().shallow_removals, 2);

        doc.parse("[]", true).unwrap();
        assert!(!doc.is_valid(a));
        assert!(!doc.is_valid(b));
        let stats = doc.stats();
        assert_eq!(stats.pending_orphans, 0);
        assert_eq!(stats.orphans_released, 2);
    }

    #[test]
    fn test_orphan_can_be_removed_from_again() {
        let mut doc = catalog();
        let orphan = doc.remove_shallow(None, &path!["items"]).unwrap().unwrap();
        let first = doc.remove_deep(Some(orphan), &path![0]).unwrap().unwrap();
        assert_eq!(doc.size(Some(orphan)).unwrap(), 2);
        let sku = first.find(None, &path!["sku"]).unwrap();
        assert_eq!(first.value(sku).unwrap(), Scalar::String("A-1".into()));
    }

    #[test]
    fn test_shallow_removal_in_place_mode() {
        let mut doc = Document::new();
        doc.parse_in_place(CATALOG.as_bytes(), true).unwrap();
        let store = doc.remove_shallow(None, &path!["store"]).unwrap().unwrap();
        assert_eq!(doc.value(Some(store)).unwrap(), Scalar::String("north".into()));
        assert_eq!(doc.destroy().orphans_released, 1);
    }
}

mod generic {
    use super::*;

    #[test]
    fn test_remove_dispatches_on_mode() {
        let mut doc = catalog();
        let removed = doc
            .remove(None, &path!["rating"], RemoveMode::Shallow)
            .unwrap()
            .unwrap();
        assert!(matches!(removed, Removed::Shallow(_)));
        assert!(removed.handle().is_some());

        let removed = doc
            .remove(None, &path!["open"], RemoveMode::Deep)
            .unwrap()
            .unwrap();
        assert!(removed.handle().is_none());
        let open = removed.into_document().unwrap();
        assert_eq!(open.value(None).unwrap(), Scalar::Bool(true));
    }

    #[test]
    fn test_root_and_missing_paths() {
        let mut doc = catalog();
        assert_eq!(
            doc.remove(None, &[], RemoveMode::Shallow).unwrap_err(),
            Error::CannotRemoveRoot
        );
        assert!(doc.remove(None, &path!["nope"], RemoveMode::Deep).unwrap().is_none());
        assert!(doc.remove(None, &path!["items", 9], RemoveMode::Shallow).unwrap().is_none());
        assert_eq!(doc.size(None).unwrap(), 6);
    }

    #[test]
    fn test_invalid_start_handle() {
        let mut doc = catalog();
        let other = catalog();
        let foreign = other.find(None, &path!["address"]).unwrap();
        assert_eq!(
            doc.remove(foreign, &path!["city"], RemoveMode::Deep).unwrap_err(),
            Error::InvalidHandle
        );
    }
}
