use codemap::core::resolver::ImportResolver;
use std::path::{Path, PathBuf};

fn resolver(files: &[PathBuf]) -> ImportResolver<'_> {
    ImportResolver::new(files.iter().map(PathBuf::as_path))
}

#[test]
fn resolver_appends_extensions() {
    let files = vec![PathBuf::from("/project/src/utils.ts")];
    let r = resolver(&files);

    assert_eq!(
        r.resolve("./utils", Path::new("/project/src")),
        Some(Path::new("/project/src/utils.ts"))
    );
}

#[test]
fn resolver_is_independent_of_call_order() {
    let files = vec![
        PathBuf::from("/project/src/utils.ts"),
        PathBuf::from("/project/src/other.js"),
    ];
    let r = resolver(&files);

    let _ = r.resolve("./other", Path::new("/project/src"));
    let first = r.resolve("./utils", Path::new("/project/src"));
    let _ = r.resolve("./missing", Path::new("/project/src"));
    let second = r.resolve("./utils", Path::new("/project/src"));

    assert_eq!(first, second);
    assert_eq!(first, Some(Path::new("/project/src/utils.ts")));
}

#[test]
fn resolver_prefers_ts_over_js_and_files_over_index() {
    let files = vec![
        PathBuf::from("/p/src/api.js"),
        PathBuf::from("/p/src/api.ts"),
        PathBuf::from("/p/src/api/index.ts"),
    ];
    let r = resolver(&files);

    assert_eq!(
        r.resolve("./api", Path::new("/p/src")),
        Some(Path::new("/p/src/api.ts"))
    );
}

#[test]
fn resolver_falls_back_to_directory_index() {
    let files = vec![PathBuf::from("/p/src/components/index.tsx")];
    let r = resolver(&files);

    assert_eq!(
        r.resolve("./components", Path::new("/p/src")),
        Some(Path::new("/p/src/components/index.tsx"))
    );
}

#[test]
fn resolver_drops_bare_and_unknown_specifiers() {
    let files = vec![PathBuf::from("/p/src/react.ts")];
    let r = resolver(&files);

    assert_eq!(r.resolve("react", Path::new("/p/src")), None);
    assert_eq!(r.resolve("@scope/pkg", Path::new("/p/src")), None);
    assert_eq!(r.resolve("./nope", Path::new("/p/src")), None);
}
