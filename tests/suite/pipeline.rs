//! Analyzer output through parse, expand and aggregate, via the public API.

use std::path::Path;

use nudge_lsp::{aggregate, collect_output, expand, parse_output};
use nudge_types::{DiagnosticSeverity, SOURCE_TAG};

const REPORT: &str = "\
nudge 0.4.2: scanning 3 files
::notice file=cmd/server/main.go,line=12,col=5,endLine=14,endColumn=2::function is too long
::warning file=cmd/server/main.go,line=1,col=1,endLine=1,endColumn=1::not ours
::notice file=src/lib.rs,line=3,col=1,endLine=3,endColumn=9::prefer `?` over match
::notice file=cmd/server/main.go,line=30,col=1,endLine=30,endColumn=1::shadowed err
done in 0.12s
";

#[test]
fn report_groups_by_file_in_first_seen_order() {
    let set = collect_output(REPORT, false);
    let paths: Vec<&Path> = set.paths().collect();
    assert_eq!(
        paths,
        vec![Path::new("cmd/server/main.go"), Path::new("src/lib.rs")]
    );

    let main = set.get(Path::new("cmd/server/main.go")).unwrap();
    let lines: Vec<u32> = main.iter().map(|d| d.range().start.line).collect();
    assert_eq!(lines, vec![11, 12, 13, 29]);
    assert!(main.iter().all(|d| d.severity() == DiagnosticSeverity::Information));
    assert!(main.iter().all(|d| d.source() == SOURCE_TAG));
    assert_eq!(set.total_count(), 5);
}

#[test]
fn stepwise_pipeline_matches_collect_output() {
    let stepwise = aggregate(parse_output(REPORT).flat_map(|record| expand(&record)));
    assert_eq!(stepwise, collect_output(REPORT, false));
}

#[test]
fn crlf_output_parses_cleanly() {
    let output = "::notice file=a.c,line=2,col=3,endLine=2,endColumn=3::trailing\r\n";
    let set = collect_output(output, false);
    let diag = &set.get(Path::new("a.c")).unwrap()[0];
    assert_eq!(diag.message(), "trailing");
}

#[test]
fn degenerate_spans_depend_on_strictness() {
    let output = "\
::notice file=z.go,line=0,col=0,endLine=0,endColumn=0::zero span
::notice file=r.go,line=9,col=1,endLine=4,endColumn=1::reversed span
::notice file=ok.go,line=1,col=1,endLine=1,endColumn=1::fine
";
    let lenient = collect_output(output, false);
    let zero = lenient.get(Path::new("z.go")).unwrap();
    assert_eq!(zero.len(), 1);
    assert_eq!(zero[0].range().start.line, 0);
    assert_eq!(zero[0].range().start.character, 0);
    assert!(!lenient.contains(Path::new("r.go")));

    let strict = collect_output(output, true);
    let paths: Vec<&Path> = strict.paths().collect();
    assert_eq!(paths, vec![Path::new("ok.go")]);
}

#[test]
fn empty_output_yields_empty_set() {
    assert!(collect_output("", false).is_empty());
    assert!(collect_output("no annotations here\n", true).is_empty());
}

#[test]
fn runaway_span_is_dropped_without_touching_neighbours() {
    let output = "\
::notice file=a.go,line=1,col=1,endLine=4294967295,endColumn=1::runaway
::notice file=a.go,line=2,col=1,endLine=2,endColumn=1::normal
";
    let set = collect_output(output, false);
    let diags = set.get(Path::new("a.go")).unwrap();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message(), "normal");
}
