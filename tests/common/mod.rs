use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    /// Working directory for runs; relative output paths land here.
    pub work: PathBuf,
    /// Fixture config tree with two module trees (cvode, arkode).
    pub tree: PathBuf,
    pub backend: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        let work = tmp.path().join("work");
        fs::create_dir_all(&work).expect("create work dir");

        let tree = make_fixture_tree(tmp.path());
        let backend = write_fake_backend(tmp.path());

        Self {
            _tmp: tmp,
            home,
            work,
            tree,
            backend,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("bindrig");
        cmd.env("HOME", &self.home)
            .env("BINDRIG_BACKEND", &self.backend)
            .current_dir(&self.work);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        self.run_json_expect(args, 0)
    }

    pub fn run_json_expect(&self, args: &[&str], code: i32) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .code(code)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    /// Write a file under the working directory, creating parents.
    pub fn write_file(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.work.join(rel);
        fs::create_dir_all(path.parent().expect("file has parent")).expect("create parent dirs");
        fs::write(&path, body).expect("write fixture file");
        path
    }
}

fn make_fixture_tree(base: &Path) -> PathBuf {
    let tree = base.join("tree");
    let cvode = tree.join("cvode");
    let arkode = tree.join("arkode");
    fs::create_dir_all(&cvode).expect("create cvode dir");
    fs::create_dir_all(&arkode).expect("create arkode dir");

    fs::write(cvode.join("cvode.h"), "typedef void* CVodeMem;\n").expect("write header");
    fs::write(cvode.join("cvode_ls.h"), "typedef void* CVLsMem;\n").expect("write header");
    fs::write(arkode.join("arkode.h"), "typedef void* ARKodeMem;\n").expect("write header");

    fs::write(
        cvode.join("generate.yaml"),
        "modules:
  all:
    pointer_types:
      SUNContext: shared
    defines: [SUN_COMM_NULL]
  cvode:
    output: out/cvode
    headers: [cvode.h, cvode_ls.h]
    pointer_types:
      N_Vector: shared
    nullable_params: [constraints]
    functions:
      exclude: [CVodeSetErrFile]
      adapters:
        CVodeGetNumSteps: output-param-to-return
",
    )
    .expect("write cvode config");

    fs::write(
        arkode.join("generate.yaml"),
        "modules:
  arkode:
    output: out/arkode
    headers: [arkode.h]
    enums:
      exclude: [ARKInternal]
    functions:
      adapters:
        ARKodeEvolve: array-pointer-to-sequence
",
    )
    .expect("write arkode config");

    tree
}

/// Stand-in for the external parser/generator: echoes the verb, the header
/// path, and the policy JSON it received on stdin, and fails for any header
/// whose path contains `broken`.
fn write_fake_backend(base: &Path) -> PathBuf {
    let path = base.join("fake-backend");
    let script = "#!/usr/bin/env sh
verb=\"$1\"
header=\"$2\"
policy=$(cat)
case \"$header\" in
  *broken*)
    echo \"unparseable declaration in $header\" >&2
    exit 1
    ;;
esac
echo \"// $verb $header\"
echo \"$policy\"
";
    fs::write(&path, script).expect("write backend stub");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path)
            .expect("stat backend stub")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod backend stub");
    }
    path
}
