use mantle_fs::FileSetResolver;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_resolution_order_is_sorted_and_stable(
        stems in proptest::collection::btree_set("[a-z0-9][a-z0-9_-]{0,11}", 1..12)
    ) {
        let temp = tempfile::tempdir().unwrap();
        // Create in reverse to decouple creation order from name order
        for stem in stems.iter().rev() {
            fs::write(temp.path().join(format!("{stem}.yml")), "---\n").unwrap();
        }

        let resolver = FileSetResolver::default();
        let first = resolver.resolve(temp.path()).unwrap();
        let second = resolver.resolve(temp.path()).unwrap();
        prop_assert_eq!(&first, &second);

        let names: Vec<String> = first
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let expected: BTreeSet<String> = stems.iter().map(|s| format!("{s}.yml")).collect();
        prop_assert_eq!(names, expected.into_iter().collect::<Vec<_>>());
    }
}
