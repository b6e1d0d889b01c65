#![allow(missing_docs)]

use std::process::{Command, Output};

use attrtree_testkit::{fixture_path, read_json_fixture, scratch_file};
use serde_json::Value;

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_attrtree")).args(args).output().expect("attrtree command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(
		output.status.success(),
		"attrtree command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn arena() -> String {
	fixture_path("arena.json").display().to_string()
}

#[test]
fn load_json_reports_the_bound_tree() {
	let json = run_json(&["load", &arena(), "--json"]);

	assert_eq!(json["compression"], "none");
	assert_eq!(json["root_class"], "Scope");
	assert_eq!(json["nodes"], 6);

	let entities = &json["document"]["Entities"];
	assert_eq!(entities["class"], "Entity");
	assert_eq!(entities["value"][0]["Name"]["value"], "hero");
	assert_eq!(entities["value"][0]["Health"]["value"], 100);
	assert_eq!(entities["value"][0]["Actions"]["class"], "ActionIncrement");
	assert_eq!(entities["value"][1]["Scale"]["value"], "vec4(2, 2, 2, 0)");
	assert_eq!(entities["value"][1]["Animations"]["value"][0]["Clip"]["value"], "idle");
	assert_eq!(json["document"]["SpawnPoints"]["value"][1], "vec4(4, 0, 4, 1)");
}

#[test]
fn zstd_documents_load_identically() {
	let plain = read_json_fixture("arena.json");
	let bytes = serde_json::to_vec(&plain).expect("serialize fixture");
	let packed = zstd::encode_all(&bytes[..], 3).expect("compress fixture");
	let path = scratch_file("arena.json.zst", &packed);

	let compressed = run_json(&["load", &path.display().to_string(), "--json"]);
	let reference = run_json(&["load", &arena(), "--json"]);

	assert_eq!(compressed["compression"], "zstd");
	assert_eq!(compressed["document"], reference["document"]);
	assert_eq!(compressed["nodes"], reference["nodes"]);
}

#[test]
fn text_output_lists_entries() {
	let output = run(&["load", &arena()]);
	assert!(output.status.success());
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("Title: string = \"arena\""));
	assert!(stdout.contains("Entities: table[2]"));
	assert!(stdout.contains("[0] Entity"));
}

#[test]
fn types_json_lists_merged_schemas() {
	let json = run_json(&["types", "--json"]);

	let classes = json["classes"].as_array().expect("classes array");
	assert!(classes.iter().any(|class| class == "Scope"));

	let types = json["types"].as_array().expect("types array");
	let increment = types.iter().find(|item| item["name"] == "ActionIncrement").expect("ActionIncrement listed");
	assert_eq!(increment["parent"], "Action");
	let names = increment["signatures"].as_array().expect("signatures").iter().map(|signature| signature["name"].clone()).collect::<Vec<_>>();
	assert_eq!(names, ["Name", "Target", "Step"]);
	assert_eq!(increment["signatures"][0]["inherited"], true);
	assert_eq!(increment["signatures"][2]["inherited"], false);
}

#[test]
fn search_walks_up_to_the_owning_node() {
	let json = run_json(&["search", &arena(), "Health", "--at", "Entities[0].Actions[0]", "--json"]);
	assert_eq!(json["found"], true);
	assert_eq!(json["owner"], "Entities[0]");
	assert_eq!(json["kind"], "integer");
	assert_eq!(json["value"], 100);

	let json = run_json(&["search", &arena(), "Title", "--at", "Entities[1]", "--json"]);
	assert_eq!(json["owner"], ".");
	assert_eq!(json["value"], "arena");

	let json = run_json(&["search", &arena(), "Missing", "--json"]);
	assert_eq!(json["found"], false);
	assert!(json["owner"].is_null());
}

#[test]
fn bad_documents_fail_with_the_entry_path() {
	let output = run(&["load", &fixture_path("bad_kind.json").display().to_string()]);
	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: Hero[0].Name"), "unexpected stderr: {stderr}");

	let output = run(&["load", &arena(), "--max-depth", "1"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("nesting exceeds max depth 1"));

	let output = run(&["search", &arena(), "Title", "--at", "Nowhere[3]"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("node path not found"));
}
