//! Path lookup and container iteration

mod common;

use arbor_json::{Document, Error, Handle, Scalar, Step, path};
use common::{catalog, init_tracing};

mod find {
    use super::*;

    #[test]
    fn test_nested_lookup_from_root_and_handle() {
        let doc = catalog();
        let item = doc.find(None, &path!["items", 1]).unwrap().unwrap();
        let sku = doc.find(Some(item), &path!["sku"]).unwrap().unwrap();
        assert_eq!(doc.value(Some(sku)).unwrap(), Scalar::String("B-2".into()));

        let direct = doc.find(None, &path!["items", 1, "sku"]).unwrap().unwrap();
        assert_eq!(direct, sku);
    }

    #[test]
    fn test_misses_are_not_errors() {
        let doc = catalog();
        assert!(doc.find(None, &path!["missing"]).unwrap().is_none());
        assert!(doc.find(None, &path!["items", 3]).unwrap().is_none());
        assert!(doc.find(None, &path!["items", "sku"]).unwrap().is_none());
        assert!(doc.find(None, &path!["address", 0]).unwrap().is_none());
        assert!(doc.find(None, &path!["store", "x"]).unwrap().is_none());
    }

    #[test]
    fn test_empty_path_names_start() {
        let doc = catalog();
        let root = doc.find(None, &[]).unwrap().unwrap();
        assert_eq!(Some(root), doc.root());

        let address = doc.find(None, &path!["address"]).unwrap().unwrap();
        assert_eq!(doc.find(Some(address), &[]).unwrap(), Some(address));
    }

    #[test]
    fn test_invalid_start_is_an_error() {
        let mut doc = catalog();
        let stale = doc.find(None, &path!["address"]).unwrap().unwrap();
        doc.parse("{}", true).unwrap();
        assert_eq!(doc.find(Some(stale), &path!["city"]), Err(Error::InvalidHandle));
    }

    #[test]
    fn test_duplicate_keys_resolve_to_first() {
        init_tracing();
        let doc = Document::from_json(r#"{"k":"first","k":"second"}"#, true).unwrap();
        let k = doc.find(None, &path!["k"]).unwrap();
        assert_eq!(doc.value(k).unwrap(), Scalar::String("first".into()));
    }

    #[test]
    fn test_steps_from_json() {
        let doc = catalog();
        let steps: Vec<Step> = serde_json::from_str(r#"["items", 2, "tags", 0]"#).unwrap();
        let tag = doc.find(None, &steps).unwrap();
        assert_eq!(doc.value(tag).unwrap(), Scalar::String("clearance".into()));
    }

    #[test]
    fn test_no_tree_is_an_error() {
        init_tracing();
        let doc = Document::new();
        assert_eq!(doc.find(None, &path!["a"]), Err(Error::InvalidHandle));
    }
}

mod iteration {
    use super::*;

    #[test]
    fn test_members_in_insertion_order() {
        let doc = catalog();
        let names: Vec<String> = doc
            .members(None)
            .unwrap()
            .map(|item| item.map(|(name, _)| name))
            .collect::<arbor_json::Result<_>>()
            .unwrap();
        assert_eq!(names, ["store", "open", "rating", "manager", "items", "address"]);
    }

    #[test]
    fn test_duplicate_members_are_all_visited() {
        init_tracing();
        let doc = Document::from_json(r#"{"k":1,"k":2}"#, true).unwrap();
        let values: Vec<Scalar> = doc
            .members(None)
            .unwrap()
            .map(|item| doc.value(Some(item.unwrap().1)).unwrap())
            .collect();
        assert_eq!(values, [Scalar::Number(1.0), Scalar::Number(2.0)]);
    }

    #[test]
    fn test_elements_with_indices() {
        let doc = catalog();
        let items = doc.find(None, &path!["items"]).unwrap();
        let skus: Vec<(usize, Scalar)> = doc
            .elements(items)
            .unwrap()
            .map(|item| {
                let (index, handle) = item.unwrap();
                let sku = doc.find(Some(handle), &path!["sku"]).unwrap();
                (index, doc.value(sku).unwrap())
            })
            .collect();
        assert_eq!(
            skus,
            [
                (0, Scalar::String("A-1".into())),
                (1, Scalar::String("B-2".into())),
                (2, Scalar::String("C-3".into())),
            ]
        );
    }

    #[test]
    fn test_empty_containers() {
        let doc = catalog();
        let tags = doc.find(None, &path!["items", 1, "tags"]).unwrap();
        assert_eq!(doc.elements(tags).unwrap().count(), 0);

        let empty = Document::from_json("{}", true).unwrap();
        assert!(empty.members(None).unwrap().next().is_none());
    }

    #[test]
    fn test_generic_iter_yields_steps() {
        let doc = catalog();
        let address = doc.find(None, &path!["address"]).unwrap();
        let steps: Vec<Step> = doc
            .iter(address)
            .unwrap()
            .map(|item| item.unwrap().0)
            .collect();
        assert_eq!(steps, [Step::from("city"), Step::from("zip")]);

        let tags = doc.find(None, &path!["items", 0, "tags"]).unwrap();
        let steps: Vec<Step> = doc.iter(tags).unwrap().map(|item| item.unwrap().0).collect();
        assert_eq!(steps, [Step::Index(0), Step::Index(1)]);
    }

    #[test]
    fn test_wrong_container_kind() {
        let doc = catalog();
        let items = doc.find(None, &path!["items"]).unwrap();
        let store = doc.find(None, &path!["store"]).unwrap();

        let message = |err: Error| err.to_string();
        assert_eq!(message(doc.members(items).unwrap_err()), "members() not allowed on an array");
        assert_eq!(message(doc.elements(None).unwrap_err()), "elements() not allowed on an object");
        assert_eq!(message(doc.iter(store).unwrap_err()), "iter() not allowed on a primitive type");
    }

    #[test]
    fn test_yielded_handles_are_registered() {
        let doc = catalog();
        let handles: Vec<Handle> = doc
            .members(None)
            .unwrap()
            .map(|item| item.unwrap().1)
            .collect();
        assert!(handles.iter().all(|h| doc.is_valid(*h)));
        assert_eq!(doc.value_type(Some(handles[4])).unwrap(), arbor_json::ValueType::Array);
    }
}

mod invalidation {
    use super::*;

    #[test]
    fn test_reparse_invalidates_iterator_once() {
        let mut doc = catalog();
        let mut members = doc.members(None).unwrap();
        assert!(members.next().unwrap().is_ok());

        doc.parse(r#"{"x":1}"#, true).unwrap();
        assert_eq!(members.next().unwrap().unwrap_err(), Error::IteratorInvalidated);
        assert!(members.next().is_none());
    }

    #[test]
    fn test_dropped_document_invalidates_iterator() {
        let doc = catalog();
        let mut elements = doc
            .elements(doc.find(None, &path!["items"]).unwrap())
            .unwrap();
        drop(doc);
        assert_eq!(elements.next().unwrap().unwrap_err(), Error::IteratorInvalidated);
        assert!(elements.next().is_none());
    }

    #[test]
    fn test_deep_removal_of_container_invalidates_iterator() {
        let mut doc = catalog();
        let items = doc.find(None, &path!["items"]).unwrap();
        let mut elements = doc.elements(items).unwrap();
        assert_eq!(elements.next().unwrap().unwrap().0, 0);

        doc.remove_deep(None, &path!["items"]).unwrap().unwrap();
        assert_eq!(elements.next().unwrap().unwrap_err(), Error::IteratorInvalidated);
    }

    #[test]
    fn test_shallow_removal_of_container_keeps_iterator() {
        let mut doc = catalog();
        let address = doc.find(None, &path!["address"]).unwrap();
        let mut members = doc.members(address).unwrap();
        assert_eq!(members.next().unwrap().unwrap().0, "city");

        doc.remove_shallow(None, &path!["address"]).unwrap().unwrap();
        assert_eq!(members.next().unwrap().unwrap().0, "zip");
        assert!(members.next().is_none());
    }

    #[test]
    fn test_removing_elements_shortens_iteration() {
        let mut doc = catalog();
        let items = doc.find(None, &path!["items"]).unwrap();
        let mut seen = Vec::new();
        let mut elements = doc.elements(items).unwrap();
        while let Some(item) = elements.next() {
            let (index, _) = item.unwrap();
            seen.push(index);
            if index == 0 {
                doc.remove_deep(items, &path![2]).unwrap().unwrap();
            }
        }
        assert_eq!(seen, [0, 1]);
    }

    #[test]
    fn test_handles_survive_unrelated_removal() {
        let mut doc = catalog();
        let city = doc.find(None, &path!["address", "city"]).unwrap().unwrap();
        doc.remove_deep(None, &path!["items"]).unwrap().unwrap();
        assert!(doc.is_valid(city));
        assert_eq!(doc.value(Some(city)).unwrap(), Scalar::String("Oslo".into()));
    }
}
