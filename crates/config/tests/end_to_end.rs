use std::path::Path;

use hotparam_config::{ConfigReader, OutSlot, RawArg, RawOut, ReaderSettings, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn reader_in(dir: &TempDir) -> ConfigReader {
	let _ = tracing_subscriber::fmt::try_init();
	ConfigReader::new(ReaderSettings::default().with_script(dir.path().join("tuning.lua")))
}

fn replace(path: &Path, from: &str, to: &str) {
	let text = std::fs::read_to_string(path).unwrap();
	assert!(text.contains(from), "script should contain {from:?}:\n{text}");
	std::fs::write(path, text.replace(from, to)).unwrap();
}

#[test]
fn edited_values_and_callables_are_picked_up() {
	let dir = tempfile::tempdir().unwrap();
	let mut reader = reader_in(&dir);
	reader.register_doc("count", 5i64, "Number of workers").unwrap();
	reader.register_callable("add", "ii>i", "Combine two counts").unwrap();
	assert!(reader.write_script().unwrap());

	assert_eq!(reader.read::<i64>("count").unwrap(), 5);

	let script = reader.script_path().to_path_buf();
	replace(&script, "count = 5", "count = 9");
	assert_eq!(reader.read::<i64>("count").unwrap(), 9);

	replace(&script, "\t-- Define 'add' here. Signature: \"ii>i\"\n", "\treturn arg0 + arg1\n");
	let add = reader.read_callable("add", "ii>i").unwrap();
	assert_eq!(add.call(&[Value::Int(3), Value::Int(4)]).unwrap(), vec![Value::Int(7)]);
}

#[test]
fn generated_defaults_read_back_unchanged() {
	let dir = tempfile::tempdir().unwrap();
	let mut reader = reader_in(&dir);
	reader.register("ratio", 0.1f64).unwrap();
	reader.register("enabled", true).unwrap();
	reader.register("label", "tab\there \"quoted\"\n".to_string()).unwrap();
	reader.register("weights", vec![1.5f64, -2.0, 1e300]).unwrap();
	reader.register("grid", [[1i64, 2, 3], [4, 5, 6]]).unwrap();
	reader.register("cube", vec![vec![vec![true]], vec![vec![false]]]).unwrap();
	reader.register("names", vec!["a".to_string(), "]]".to_string()]).unwrap();
	reader.register("smallest", i64::MIN).unwrap();
	assert!(reader.write_script().unwrap());

	assert_eq!(reader.read::<f64>("ratio").unwrap(), 0.1);
	assert!(reader.read::<bool>("enabled").unwrap());
	assert_eq!(reader.read::<String>("label").unwrap(), "tab\there \"quoted\"\n");
	assert_eq!(reader.read::<Vec<f64>>("weights").unwrap(), vec![1.5, -2.0, 1e300]);
	assert_eq!(reader.read::<[f64; 3]>("weights").unwrap(), [1.5, -2.0, 1e300]);
	assert_eq!(reader.read::<[[i64; 3]; 2]>("grid").unwrap(), [[1, 2, 3], [4, 5, 6]]);
	assert_eq!(reader.read::<Vec<Vec<i64>>>("grid").unwrap(), vec![vec![1, 2, 3], vec![4, 5, 6]]);
	assert_eq!(reader.read::<[[[bool; 1]; 1]; 2]>("cube").unwrap(), [[[true]], [[false]]]);
	assert_eq!(reader.read::<Vec<String>>("names").unwrap(), vec!["a".to_string(), "]]".to_string()]);
	assert_eq!(reader.read::<i64>("smallest").unwrap(), i64::MIN);
}

#[test]
fn read_into_raw_buffer() {
	let dir = tempfile::tempdir().unwrap();
	let mut reader = reader_in(&dir);
	reader.register("weights", vec![1.0f64, 2.0, 3.0]).unwrap();
	reader.write_script().unwrap();
	replace(reader.script_path(), "{1.0, 2.0, 3.0}", "{4, 5.5, 6}");

	let mut buf = [0.0f64; 3];
	// SAFETY: `buf` holds three initialized doubles.
	unsafe { reader.read_into_raw("weights", buf.as_mut_ptr(), buf.len()) }.unwrap();
	assert_eq!(buf, [4.0, 5.5, 6.0]);

	let mut short = [0.0f64; 2];
	// SAFETY: as above, with two elements.
	let err = unsafe { reader.read_into_raw("weights", short.as_mut_ptr(), short.len()) }.unwrap_err();
	assert_eq!(err.to_string(), "parameter 'weights' has dimensions [3], expected [2]");
	assert_eq!(short, [0.0, 0.0]);

	let mut out: Vec<f64> = Vec::new();
	reader.read_into("weights", &mut out).unwrap();
	assert_eq!(out, vec![4.0, 5.5, 6.0]);
}

#[test]
fn read_grids_into_raw_buffers_row_major() {
	let dir = tempfile::tempdir().unwrap();
	let mut reader = reader_in(&dir);
	reader.register("grid", vec![vec![1i64, 2, 3], vec![4, 5, 6]]).unwrap();
	reader.register("cube", [[[0.5f64, 1.5], [2.5, 3.5]], [[4.5, 5.5], [6.5, 7.5]]]).unwrap();
	reader.write_script().unwrap();

	let mut grid = [0i64; 6];
	// SAFETY: `grid` holds six initialized ints.
	unsafe { reader.read_into_raw_dims("grid", grid.as_mut_ptr(), &[2, 3]) }.unwrap();
	assert_eq!(grid, [1, 2, 3, 4, 5, 6]);

	let mut cube = [0.0f64; 8];
	// SAFETY: `cube` holds eight initialized doubles.
	unsafe { reader.read_into_raw_dims("cube", cube.as_mut_ptr(), &[2, 2, 2]) }.unwrap();
	assert_eq!(cube, [0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5]);

	let mut wrong = [0i64; 6];
	// SAFETY: as above; the transposed dims still cover six elements.
	let err = unsafe { reader.read_into_raw_dims("grid", wrong.as_mut_ptr(), &[3, 2]) }.unwrap_err();
	assert_eq!(err.to_string(), "parameter 'grid' has dimensions [2, 3], expected [3, 2]");
	assert_eq!(wrong, [0; 6]);

	// SAFETY: six initialized ints, but the rank does not match the registration.
	let err = unsafe { reader.read_into_raw("grid", wrong.as_mut_ptr(), 6) }.unwrap_err();
	assert_eq!(err.to_string(), "parameter 'grid' is registered as int[][], not int[]");

	// SAFETY: an unsupported rank is rejected before any write.
	let err = unsafe { reader.read_into_raw_dims("grid", wrong.as_mut_ptr(), &[6, 1, 1, 1]) }.unwrap_err();
	assert_eq!(err.to_string(), "parameter 'grid' has dimensions [2, 3], expected [6, 1, 1, 1]");

	replace(reader.script_path(), "{{1, 2, 3}, {4, 5, 6}}", "{{1, 2, 3}, {4, 5, 9}}");
	// SAFETY: as above.
	unsafe { reader.read_into_raw_dims("grid", grid.as_mut_ptr(), &[2, 3]) }.unwrap();
	assert_eq!(grid, [1, 2, 3, 4, 5, 9]);
}

#[test]
fn hooks_write_through_slots_and_raw_pointers() {
	let dir = tempfile::tempdir().unwrap();
	let mut reader = reader_in(&dir);
	reader.register_callable("stats", "ad>dd", "").unwrap();
	reader.register_callable("scale", "aid>ad", "").unwrap();
	std::fs::write(
		reader.script_path(),
		r#"
stats = function(xs)
	local lo, hi = math.huge, -math.huge
	for _, x in ipairs(xs) do lo = math.min(lo, x) hi = math.max(hi, x) end
	return lo, hi
end
scale = function(xs, k)
	local out = {}
	for i, x in ipairs(xs) do out[i] = x * k end
	return out
end
"#,
	)
	.unwrap();

	let stats = reader.read_callable("stats", "ad>dd").unwrap();
	let (mut lo, mut hi) = (0.0, 0.0);
	stats
		.call_into(&[Value::from(vec![3.0, -1.0, 2.0])], &mut [OutSlot::Double(&mut lo), OutSlot::Double(&mut hi)])
		.unwrap();
	assert_eq!((lo, hi), (-1.0, 3.0));

	let scale = reader.read_callable("scale", "aid>ad").unwrap();
	let input = [1i64, 2, 3];
	let mut output = [0.0f64; 3];
	// SAFETY: both buffers are live, initialized and disjoint.
	unsafe {
		scale.call_raw(
			&[RawArg::IntArray { ptr: input.as_ptr(), len: input.len() }, RawArg::Double(0.5)],
			&[RawOut::DoubleArray { ptr: output.as_mut_ptr(), len: output.len() }],
		)
	}
	.unwrap();
	assert_eq!(output, [0.5, 1.0, 1.5]);
}

#[test]
fn script_errors_surface_verbatim() {
	let dir = tempfile::tempdir().unwrap();
	let mut reader = reader_in(&dir);
	reader.register_callable("boom", "i>i", "").unwrap();
	std::fs::write(reader.script_path(), "boom = function(n) error('bad input ' .. n, 0) end\n").unwrap();

	let boom = reader.read_callable("boom", "i>i").unwrap();
	let err = boom.call(&[Value::Int(3)]).unwrap_err();
	assert_eq!(err.to_string(), "call to 'boom' failed: bad input 3");
}
