//! End-to-end LSP sessions against a scripted analyzer.

use std::time::Duration;

use nudge_config::ScanConfig;

use crate::common::{ScriptedAnalyzer, notice, start_server, uri};

fn diagnostics(publication: &serde_json::Value) -> &Vec<serde_json::Value> {
    publication["diagnostics"].as_array().unwrap()
}

#[tokio::test]
async fn initialize_advertises_toggle_command() {
    let root = tempfile::tempdir().unwrap();
    let (mut client, server) = start_server(ScriptedAnalyzer::default(), ScanConfig::default());

    let response = client.initialize(&[root.path()]).await;
    let capabilities = &response["result"]["capabilities"];
    assert_eq!(
        capabilities["executeCommandProvider"]["commands"][0],
        "nudge.checkWorkspace"
    );
    assert_eq!(capabilities["textDocumentSync"]["save"]["includeText"], false);

    client.shutdown(server).await;
}

#[tokio::test]
async fn toggle_on_publishes_one_diagnostic_per_line() {
    let root = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::default();
    analyzer.succeed(root.path(), &notice("main.go", 3, 5, 4, "split this function"));
    let (mut client, server) = start_server(analyzer.clone(), ScanConfig::default());
    client.initialize(&[root.path()]).await;
    assert_eq!(analyzer.calls(), 0);

    let response = client.toggle().await;
    assert_eq!(response["result"], serde_json::Value::Null);

    let publication = client.publication().await;
    assert_eq!(publication["uri"], uri(&root.path().join("main.go")));
    let items = diagnostics(&publication);
    assert_eq!(items.len(), 2);
    for (item, line) in items.iter().zip([2, 3]) {
        assert_eq!(item["range"]["start"]["line"], line);
        assert_eq!(item["range"]["start"]["character"], 4);
        assert_eq!(item["range"]["end"]["line"], line + 1);
        assert_eq!(item["range"]["end"]["character"], 0);
        assert_eq!(item["severity"], 3);
        assert_eq!(item["source"], "nudge");
        assert_eq!(item["message"], "split this function");
    }

    client.shutdown(server).await;
}

#[tokio::test]
async fn start_active_scans_after_initialized() {
    let root = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::default();
    analyzer.succeed(root.path(), &notice("lib.rs", 1, 1, 1, "missing docs"));
    let config = ScanConfig {
        start_active: true,
        ..ScanConfig::default()
    };
    let (mut client, server) = start_server(analyzer, config);
    client.initialize(&[root.path()]).await;

    let publication = client.publication().await;
    assert_eq!(publication["uri"], uri(&root.path().join("lib.rs")));
    assert_eq!(diagnostics(&publication).len(), 1);

    client.shutdown(server).await;
}

#[tokio::test]
async fn save_rescans_and_clears_files_that_went_quiet() {
    let root = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::default();
    let both = format!(
        "{}{}",
        notice("main.go", 10, 1, 10, "unused"),
        notice("lib.rs", 2, 1, 2, "shadowed")
    );
    analyzer.succeed(root.path(), &both);
    let (mut client, server) = start_server(analyzer.clone(), ScanConfig::default());
    client.initialize(&[root.path()]).await;
    client.toggle().await;

    let first = client.publication().await;
    let second = client.publication().await;
    assert_eq!(first["uri"], uri(&root.path().join("main.go")));
    assert_eq!(second["uri"], uri(&root.path().join("lib.rs")));

    analyzer.succeed(root.path(), &notice("lib.rs", 4, 1, 4, "shadowed"));
    client.save(&root.path().join("lib.rs")).await;

    let cleared = client.publication().await;
    assert_eq!(cleared["uri"], uri(&root.path().join("main.go")));
    assert!(diagnostics(&cleared).is_empty());

    let updated = client.publication().await;
    assert_eq!(updated["uri"], uri(&root.path().join("lib.rs")));
    assert_eq!(diagnostics(&updated)[0]["range"]["start"]["line"], 3);

    client.shutdown(server).await;
}

#[tokio::test]
async fn failed_scan_leaves_diagnostics_in_place() {
    let root = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::default();
    analyzer.succeed(root.path(), &notice("main.c", 7, 2, 7, "magic number"));
    let (mut client, server) = start_server(analyzer.clone(), ScanConfig::default());
    client.initialize(&[root.path()]).await;
    client.toggle().await;
    client.publication().await;

    analyzer.fail(root.path(), 1);
    client.save(&root.path().join("main.c")).await;
    analyzer.wait_for_calls(2).await;

    // Turning scanning off clears what is still published: the file from
    // the first scan.
    client.toggle().await;
    let cleared = client.publication().await;
    assert_eq!(cleared["uri"], uri(&root.path().join("main.c")));
    assert!(diagnostics(&cleared).is_empty());

    client.shutdown(server).await;
}

#[tokio::test]
async fn saves_are_ignored_while_inactive_or_for_other_languages() {
    let root = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::default();
    let (mut client, server) = start_server(analyzer.clone(), ScanConfig::default());
    client.initialize(&[root.path()]).await;

    client.save(&root.path().join("main.go")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(analyzer.calls(), 0);

    client.toggle().await;
    analyzer.wait_for_calls(1).await;

    client.save(&root.path().join("README.md")).await;
    let notes = root.path().join("notes.txt");
    client
        .notify(
            "textDocument/didOpen",
            serde_json::json!({
                "textDocument": { "uri": uri(&notes), "languageId": "plaintext", "version": 1, "text": "" }
            }),
        )
        .await;
    client.save(&notes).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(analyzer.calls(), 1);

    // The client's language id wins over the extension.
    let script = root.path().join("build.script");
    client
        .notify(
            "textDocument/didOpen",
            serde_json::json!({
                "textDocument": { "uri": uri(&script), "languageId": "rust", "version": 1, "text": "" }
            }),
        )
        .await;
    client.save(&script).await;
    analyzer.wait_for_calls(2).await;

    client.shutdown(server).await;
}

#[tokio::test]
async fn removing_a_workspace_folder_clears_only_its_files() {
    let one = tempfile::tempdir().unwrap();
    let two = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::default();
    analyzer.succeed(one.path(), &notice("a.go", 1, 1, 1, "first"));
    analyzer.succeed(two.path(), &notice("b.go", 1, 1, 1, "second"));
    let (mut client, server) = start_server(analyzer, ScanConfig::default());
    client.initialize(&[one.path(), two.path()]).await;
    client.toggle().await;

    let mut published = vec![
        client.publication().await["uri"].clone(),
        client.publication().await["uri"].clone(),
    ];
    published.sort_by_key(ToString::to_string);
    let mut expected = vec![
        serde_json::json!(uri(&one.path().join("a.go"))),
        serde_json::json!(uri(&two.path().join("b.go"))),
    ];
    expected.sort_by_key(ToString::to_string);
    assert_eq!(published, expected);

    client
        .notify(
            "workspace/didChangeWorkspaceFolders",
            serde_json::json!({
                "event": { "added": [], "removed": [{ "uri": uri(one.path()), "name": "one" }] }
            }),
        )
        .await;
    let cleared = client.publication().await;
    assert_eq!(cleared["uri"], uri(&one.path().join("a.go")));
    assert!(diagnostics(&cleared).is_empty());

    client.toggle().await;
    let cleared = client.publication().await;
    assert_eq!(cleared["uri"], uri(&two.path().join("b.go")));

    client.shutdown(server).await;
}

#[tokio::test]
async fn unknown_methods_and_commands_are_errors() {
    let (mut client, server) = start_server(ScriptedAnalyzer::default(), ScanConfig::default());
    client.initialize(&[]).await;

    let id = client
        .request("textDocument/hover", serde_json::json!({}))
        .await;
    assert_eq!(client.response(id).await["error"]["code"], -32601);

    let id = client
        .request(
            "workspace/executeCommand",
            serde_json::json!({ "command": "nudge.unknown" }),
        )
        .await;
    assert_eq!(client.response(id).await["error"]["code"], -32602);

    client.shutdown(server).await;
}

#[tokio::test]
async fn closing_input_stops_the_server() {
    let (client, server) = start_server(ScriptedAnalyzer::default(), ScanConfig::default());
    drop(client);
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}
