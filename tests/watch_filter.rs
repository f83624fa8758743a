// tests/watch_filter.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;

use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::FileSystem;
use assetpipe::paths::{PathEntry, PathTable};
use assetpipe::types::AssetClass;
use assetpipe::watch::hash::compute_content_hash;
use assetpipe::watch::{
    build_profiles, watch_roots, ChangeEvent, ChangeFilter, MemoryHashStore, WatchSubscription,
};
use assetpipe_test_utils::builders::ConfigFileBuilder;
use assetpipe_test_utils::project::TempProject;
use assetpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn filter_for(fs: &MockFileSystem) -> ChangeFilter {
    let table = PathTable::defaults("src", "dist");
    let profiles = build_profiles(&table, &AssetClass::DEFAULT_BUILD).unwrap();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    ChangeFilter::new("/proj", Path::new("dist"), profiles, shared)
}

fn event(class: AssetClass, path: &str) -> ChangeEvent {
    ChangeEvent {
        class,
        path: PathBuf::from(path),
    }
}

#[test]
fn changes_map_to_their_asset_class() {
    let fs = MockFileSystem::new();
    let mut filter = filter_for(&fs);

    let partial = PathBuf::from("/proj/src/scss/_vars.scss");
    let page = PathBuf::from("/proj/src/about/index.html");
    let vendor = PathBuf::from("/proj/src/vendor/css/reset.css");

    let events = filter.changes([partial.as_path(), page.as_path(), vendor.as_path()]);
    assert_eq!(
        events,
        vec![
            event(AssetClass::Style, "src/scss/_vars.scss"),
            event(AssetClass::Html, "src/about/index.html"),
            event(AssetClass::VendorCss, "src/vendor/css/reset.css"),
        ]
    );
}

#[test]
fn each_class_fires_once_per_batch() {
    let fs = MockFileSystem::new();
    let mut filter = filter_for(&fs);

    let a = PathBuf::from("/proj/src/js/a.js");
    let b = PathBuf::from("/proj/src/js/lib/b.js");
    let events = filter.changes([a.as_path(), b.as_path()]);
    assert_eq!(events, vec![event(AssetClass::Js, "src/js/a.js")]);
}

#[test]
fn outputs_and_foreign_paths_are_ignored() {
    let fs = MockFileSystem::new();
    let mut filter = filter_for(&fs);

    let output = PathBuf::from("/proj/dist/css/main.min.css");
    let outside = PathBuf::from("/elsewhere/src/index.html");
    let unwatched = PathBuf::from("/proj/README.md");
    let stack_icon = PathBuf::from("/proj/src/images/stack/home.svg");

    assert!(filter.changes([output.as_path(), outside.as_path(), unwatched.as_path()]).is_empty());
    // Sprite icons are not watched, but they are still images.
    assert_eq!(
        filter.changes([stack_icon.as_path()]),
        vec![event(AssetClass::Images, "src/images/stack/home.svg")]
    );
}

#[test]
fn unchanged_content_is_skipped_when_enabled() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/js/main.js", "let a = 1;");
    fs.add_file("/proj/src/notes.txt", "not watched");

    let mut filter = filter_for(&fs).with_skip_unchanged();
    assert_eq!(filter.prime(Path::new("src")).unwrap(), 1);

    let main = PathBuf::from("/proj/src/js/main.js");
    assert!(filter.changes([main.as_path()]).is_empty());

    fs.add_file("/proj/src/js/main.js", "let a = 2;");
    assert_eq!(
        filter.changes([main.as_path()]),
        vec![event(AssetClass::Js, "src/js/main.js")]
    );
    assert!(filter.changes([main.as_path()]).is_empty());

    // A file that vanished always counts as a change.
    let gone = PathBuf::from("/proj/src/js/gone.js");
    assert_eq!(filter.changes([gone.as_path()]).len(), 1);
}

#[test]
fn without_hashing_every_event_counts() {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/js/main.js", "let a = 1;");
    let mut filter = filter_for(&fs);
    assert_eq!(filter.prime(Path::new("src")).unwrap(), 0);

    let main = PathBuf::from("/proj/src/js/main.js");
    assert_eq!(filter.changes([main.as_path()]).len(), 1);
    assert_eq!(filter.changes([main.as_path()]).len(), 1);
}

#[test]
fn classes_without_watch_globs_get_no_profile() {
    let table = PathTable::defaults("src", "dist");
    let profiles = build_profiles(&table, &[AssetClass::Sprite, AssetClass::Fonts]).unwrap();
    let classes: Vec<AssetClass> = profiles.iter().map(|p| p.class()).collect();
    assert_eq!(classes, vec![AssetClass::Fonts]);
}

#[test]
fn only_the_bases_of_watch_globs_are_watched() {
    let table = PathTable::defaults("src", "dist");
    let roots = watch_roots(&table, &AssetClass::DEFAULT_BUILD).unwrap();
    assert_eq!(roots, vec![PathBuf::from("src")]);

    let mut table = PathTable::defaults("src", "dist");
    table.insert(
        AssetClass::Html,
        PathEntry::new(
            vec!["pages/**/*.html"],
            vec!["pages/**/*.html", "pages/partials/*.html", "!pages/drafts/*.html"],
            "dist",
        ),
    );
    table.insert(
        AssetClass::Style,
        PathEntry::new(
            vec!["assets/scss/main.scss"],
            vec!["assets/scss/**/*.scss"],
            "dist/css",
        ),
    );
    let roots = watch_roots(&table, &[AssetClass::Html, AssetClass::Style]).unwrap();
    assert_eq!(roots, vec![PathBuf::from("assets/scss"), PathBuf::from("pages")]);
}

#[test]
fn hash_store_tracks_content() {
    let mut store = MemoryHashStore::new();
    let path = Path::new("src/a.js");
    assert!(store.update(path, b"one"));
    assert!(!store.update(path, b"one"));
    assert!(store.update(path, b"two"));
    assert_eq!(store.len(), 1);
    store.forget(path);
    assert!(store.is_empty());

    // blake3 hash of "hello world"
    assert_eq!(
        compute_content_hash(b"hello world"),
        "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
    );
}

#[tokio::test]
async fn subscription_streams_source_changes() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/scss/main.scss", "body{}");

    let cfg = ConfigFileBuilder::new().build();
    let ctx = project.context(&cfg);
    let mut subscription = WatchSubscription::start(&ctx, &AssetClass::DEFAULT_BUILD)?;

    // Outputs never trigger anything; the source edit that follows does.
    project.write("dist/css/main.min.css", "BODY{}");
    project.write("src/scss/main.scss", "body{color:red}");

    let change = with_timeout(subscription.next()).await;
    assert_eq!(
        change,
        Some(event(AssetClass::Style, "src/scss/main.scss"))
    );
    Ok(())
}
