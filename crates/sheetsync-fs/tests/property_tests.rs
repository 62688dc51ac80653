use proptest::prelude::*;
use sheetsync_fs::NormalizedPath;

proptest! {
    #[test]
    fn normalized_paths_never_contain_backslashes(s in "[a-zA-Z0-9_\\\\/.]{0,40}") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
    }

    #[test]
    fn normalization_is_idempotent(s in "[a-zA-Z0-9_\\\\/.]{0,40}") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }
}
