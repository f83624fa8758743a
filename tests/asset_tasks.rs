// tests/asset_tasks.rs

use std::error::Error;

use assetpipe::errors::PipelineError;
use assetpipe::server::ReloadEvent;
use assetpipe::tasks::run_task;
use assetpipe::transform::TransformerSpec;
use assetpipe::types::{AssetClass, ReloadScope, TaskId};
use assetpipe_test_utils::builders::ConfigFileBuilder;
use assetpipe_test_utils::init_tracing;
use assetpipe_test_utils::project::TempProject;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn empty_tree_builds_nothing_for_every_class() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    let ctx = project.context(&ConfigFileBuilder::new().build());

    for class in AssetClass::ALL {
        let report = run_task(&ctx, TaskId::Build(class)).await?;
        assert!(report.is_noop(), "{class} produced {report:?}");
    }
    assert!(!project.exists("dist"));
    Ok(())
}

#[tokio::test]
async fn html_pages_are_included_and_keep_their_layout() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/index.html", "<body>@@include('partials/_header.html')</body>");
    project.write("src/about/team.html", "<p>team</p>");
    project.write("src/partials/_header.html", "<h1>Site</h1>");

    let cfg = ConfigFileBuilder::new()
        .with_pipeline(AssetClass::Html, vec![TransformerSpec::Include])
        .build();
    let ctx = project.context(&cfg);
    let report = run_task(&ctx, TaskId::Build(AssetClass::Html)).await?;

    assert_eq!(report.inputs, 2);
    assert_eq!(project.files_under("dist"), vec!["about/team.html", "index.html"]);
    assert_eq!(project.read("dist/index.html"), "<body><h1>Site</h1></body>");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn style_rebuild_is_idempotent() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/scss/main.scss", "body{}");
    project.write("src/scss/_vars.scss", "$c: red;");

    let cfg = ConfigFileBuilder::new()
        .with_pipeline(
            AssetClass::Style,
            vec![
                TransformerSpec::command_with_ext("tr a-z A-Z", ".css"),
                TransformerSpec::rename_ext(".min.css"),
            ],
        )
        .build();
    let ctx = project.context(&cfg);

    run_task(&ctx, TaskId::Build(AssetClass::Style)).await?;
    let first = project.files_under("dist");
    let first_css = project.read("dist/css/main.min.css");

    run_task(&ctx, TaskId::Build(AssetClass::Style)).await?;
    assert_eq!(project.files_under("dist"), first);
    assert_eq!(project.read("dist/css/main.min.css"), first_css);

    assert_eq!(first, vec!["css/main.min.css"]);
    assert_eq!(first_css, "BODY{}");
    Ok(())
}

#[tokio::test]
async fn vendor_files_are_concatenated() -> TestResult {
    let project = TempProject::new();
    project.write("src/vendor/js/b.js", "var b;");
    project.write("src/vendor/js/a.js", "var a;");
    project.write("src/vendor/css/reset.css", "*{}");

    let ctx = project.context(&ConfigFileBuilder::new().build());
    run_task(&ctx, TaskId::Build(AssetClass::VendorJs)).await?;
    run_task(&ctx, TaskId::Build(AssetClass::VendorCss)).await?;

    assert_eq!(project.read("dist/js/vendor.js"), "var a;\nvar b;");
    assert_eq!(project.read("dist/css/vendor.css"), "*{}");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_transformer_fails_the_task_without_output() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/js/main.js", "const x = 1;");

    let cfg = ConfigFileBuilder::new()
        .with_pipeline(AssetClass::Js, vec![TransformerSpec::command("exit 1")])
        .build();
    let ctx = project.context(&cfg);

    let err = run_task(&ctx, TaskId::Build(AssetClass::Js)).await.unwrap_err();
    assert!(matches!(err, PipelineError::Transform { .. }), "got {err:?}");
    assert!(!project.exists("dist/js/main.js"));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn images_the_web_chain_cannot_read_only_get_the_fallback() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/images/photo.jpg", "jpg-bytes");
    project.write("src/images/stack/icon.svg", "<svg/>");
    project.write("src/images/already.webp", "webp-bytes");

    // The web chain would reject anything but jpg; the fallback copies.
    let cfg = ConfigFileBuilder::new()
        .with_images(
            vec![
                TransformerSpec::command(r#"case "$ASSETPIPE_INPUT" in *.jpg) printf WEB;; *) exit 9;; esac"#),
                TransformerSpec::rename_ext(".webp"),
            ],
            vec![TransformerSpec::command("printf FALLBACK")],
        )
        .build();
    let ctx = project.context(&cfg);

    let report = run_task(&ctx, TaskId::Build(AssetClass::Images)).await?;
    assert_eq!(report.inputs, 3);
    assert_eq!(
        project.files_under("dist/images"),
        vec!["already.webp", "photo.jpg", "photo.webp", "stack/icon.svg"]
    );
    assert_eq!(project.read("dist/images/photo.webp"), "WEB");
    assert_eq!(project.read("dist/images/already.webp"), "FALLBACK");
    assert_eq!(project.read("dist/images/stack/icon.svg"), "FALLBACK");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn images_produce_web_and_fallback_variants() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/images/logo.png", "png-bytes");
    project.write("src/images/icons/arrow.jpg", "jpg-bytes");

    let cfg = ConfigFileBuilder::new()
        .with_images(vec![TransformerSpec::command_with_ext("cat", ".webp")], Vec::new())
        .build();
    let ctx = project.context(&cfg);

    let report = run_task(&ctx, TaskId::Build(AssetClass::Images)).await?;
    assert_eq!(report.inputs, 2);
    assert_eq!(report.written.len(), 4);
    assert_eq!(
        project.files_under("dist/images"),
        vec!["icons/arrow.jpg", "icons/arrow.webp", "logo.png", "logo.webp"]
    );
    assert_eq!(project.read("dist/images/logo.webp"), "png-bytes");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_image_variant_does_not_stop_the_other() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/images/logo.png", "png-bytes");

    let cfg = ConfigFileBuilder::new()
        .with_images(vec![TransformerSpec::command("exit 2")], Vec::new())
        .build();
    let ctx = project.context(&cfg);

    let result = run_task(&ctx, TaskId::Build(AssetClass::Images)).await;
    assert!(result.is_err());
    assert_eq!(project.files_under("dist/images"), vec!["logo.png"]);
    Ok(())
}

#[tokio::test]
async fn clean_is_idempotent() -> TestResult {
    let project = TempProject::new();
    project.write("dist/stale/old.css", "old");
    project.write("src/index.html", "keep");

    let ctx = project.context(&ConfigFileBuilder::new().build());
    run_task(&ctx, TaskId::Clean).await?;
    assert!(!project.exists("dist"));
    assert!(project.exists("src/index.html"));

    run_task(&ctx, TaskId::Clean).await?;
    assert!(!project.exists("dist"));
    Ok(())
}

#[tokio::test]
async fn sprite_bundles_stack_icons() -> TestResult {
    let project = TempProject::new();
    project.write(
        "src/images/stack/home.svg",
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M1 1"/></svg>"#,
    );
    project.write(
        "src/images/stack/search.svg",
        r#"<svg viewBox="0 0 16 16"><circle r="3"/></svg>"#,
    );

    let ctx = project.context(&ConfigFileBuilder::new().build());
    run_task(&ctx, TaskId::Build(AssetClass::Sprite)).await?;

    assert_eq!(project.files_under("dist/images"), vec!["sprite.svg"]);
    let sprite = project.read("dist/images/sprite.svg");
    assert!(sprite.contains(r#"<svg id="home" viewBox="0 0 24 24">"#));
    assert!(sprite.contains(r#"<svg id="search" viewBox="0 0 16 16">"#));
    Ok(())
}

#[tokio::test]
async fn services_cannot_run_as_one_shot_tasks() {
    let project = TempProject::new();
    let ctx = project.context(&ConfigFileBuilder::new().build());
    assert!(run_task(&ctx, TaskId::Watch).await.is_err());
    assert!(run_task(&ctx, TaskId::Serve).await.is_err());
}

#[tokio::test]
async fn written_outputs_notify_connected_clients() -> TestResult {
    let project = TempProject::new();
    project.write("src/scss/main.scss", "body{}");

    let cfg = ConfigFileBuilder::new().passthrough().build();
    let ctx = project.context(&cfg);
    let mut rx = ctx.reload.subscribe();

    run_task(&ctx, TaskId::Build(AssetClass::Style)).await?;
    let event = rx.try_recv()?;
    assert_eq!(
        event,
        ReloadEvent {
            scope: ReloadScope::Css,
            class: AssetClass::Style,
            paths: vec!["css/main.scss".to_string()],
        }
    );

    // Nothing written, nothing pushed.
    run_task(&ctx, TaskId::Build(AssetClass::Js)).await?;
    assert!(rx.try_recv().is_err());
    Ok(())
}
