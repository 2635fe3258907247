//! Shared test infrastructure: fake `codesign`, `ditto` and `xcrun`.
//!
//! Each fake appends its argv (tab separated, tool name first) to a spy
//! log, then behaves like a successful run of the real tool unless a
//! failure was configured for it.

#![allow(dead_code)]

use kodegen_bundler_notarize::{NotarizeOptions, ProgressOutput, ToolConfig};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::AsyncWrite;

pub const IDENTITY: &str = "Developer ID Application: X";
pub const EMAIL: &str = "dev@example.com";
pub const TEAM_ID: &str = "ABCDE12345";
pub const APP_PASSWORD: &str = "abcd-efgh-ijkl-mnop";

/// Failure injected into one fake tool (`codesign`, `ditto`, `notarytool`, `stapler`).
struct Failure {
    code: i32,
    stderr: String,
}

#[derive(Default)]
pub struct FakeToolchainBuilder {
    failures: HashMap<&'static str, Failure>,
}

impl FakeToolchainBuilder {
    pub fn fail(mut self, tool: &'static str, code: i32, stderr: &str) -> Self {
        self.failures.insert(
            tool,
            Failure {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn build(self) -> FakeToolchain {
        let root = TempDir::new().expect("create fake toolchain dir");
        let bin = root.path().join("bin");
        let spy = root.path().join("spy");
        let work_root = root.path().join("work");
        for dir in [&bin, &spy, &work_root] {
            std::fs::create_dir_all(dir).expect("create fixture dir");
        }
        let log = spy.join("calls.log");

        // One write per call so concurrent runs never interleave within a line
        let log_line = |name: &str| {
            format!(
                "tab=$(printf '\\t'); line={name}; for a in \"$@\"; do line=\"$line$tab$a\"; done\n\
                 printf '%s\\n' \"$line\" >> {}\n",
                sh_quote(&log.to_string_lossy())
            )
        };
        let fail_block = |tool: &str| match self.failures.get(tool) {
            Some(f) => format!(
                "printf '%s\\n' {} >&2\nexit {}\n",
                sh_quote(&f.stderr),
                f.code
            ),
            None => String::new(),
        };

        let codesign = format!(
            "#!/bin/sh\n{log}\
             prev=\n\
             for a in \"$@\"; do\n\
             \x20 if [ \"$prev\" = \"--entitlements\" ]; then cp \"$a\" {spy}/entitlements-$$.plist; fi\n\
             \x20 prev=$a\n\
             done\n\
             for last in \"$@\"; do :; done\n\
             echo 'codesign chatter on stdout'\n\
             if [ ! -e \"$last\" ]; then echo \"$last: No such file or directory\" >&2; exit 1; fi\n\
             {fail}\
             echo \"$last: replacing existing signature\" >&2\n",
            log = log_line("codesign"),
            spy = sh_quote(&spy.to_string_lossy()),
            fail = fail_block("codesign"),
        );

        let ditto = format!(
            "#!/bin/sh\n{log}\
             for last in \"$@\"; do :; done\n\
             {fail}\
             : > \"$last\"\n",
            log = log_line("ditto"),
            fail = fail_block("ditto"),
        );

        let xcrun = format!(
            "#!/bin/sh\n{log}\
             case \"$1\" in\n\
             --find)\n\
             \x20 echo \"/usr/bin/$2\" ;;\n\
             notarytool)\n\
             \x20 if [ ! -f \"$3\" ]; then echo \"Error: archive not found: $3\" >&2; exit 1; fi\n\
             \x20 {notary_fail}\
             \x20 echo 'Conducting pre-submission checks and initiating connection to the Apple notary service...'\n\
             \x20 echo '  id: 2efe2717-52ef-43a5-96dc-0797e4ca1041'\n\
             \x20 echo '  status: Accepted' ;;\n\
             stapler)\n\
             \x20 {staple_fail}\
             \x20 echo \"Processing: $3\"\n\
             \x20 echo 'The staple and validate action worked!' ;;\n\
             *)\n\
             \x20 echo \"xcrun: error: unable to find utility \\\"$1\\\"\" >&2; exit 72 ;;\n\
             esac\n",
            log = log_line("xcrun"),
            notary_fail = fail_block("notarytool"),
            staple_fail = fail_block("stapler"),
        );

        write_script(&bin.join("codesign"), &codesign);
        write_script(&bin.join("ditto"), &ditto);
        write_script(&bin.join("xcrun"), &xcrun);

        FakeToolchain {
            root,
            bin,
            spy,
            log,
            work_root,
        }
    }
}

pub struct FakeToolchain {
    root: TempDir,
    pub bin: PathBuf,
    pub spy: PathBuf,
    log: PathBuf,
    /// `temp_root` handed to the pipeline; must be empty after every run
    pub work_root: PathBuf,
}

impl FakeToolchain {
    pub fn new() -> Self {
        FakeToolchainBuilder::default().build()
    }

    pub fn builder() -> FakeToolchainBuilder {
        FakeToolchainBuilder::default()
    }

    pub fn tools(&self) -> ToolConfig {
        ToolConfig {
            codesign: self.bin.join("codesign"),
            ditto: self.bin.join("ditto"),
            xcrun: self.bin.join("xcrun"),
            temp_root: Some(self.work_root.clone()),
        }
    }

    pub fn options(&self, progress: Option<ProgressOutput>) -> NotarizeOptions {
        NotarizeOptions {
            email: EMAIL.to_string(),
            developer_name: IDENTITY.to_string(),
            team_id: TEAM_ID.to_string(),
            app_password: APP_PASSWORD.to_string().into(),
            progress_output: progress,
            tools: self.tools(),
        }
    }

    /// Create a minimal bundle directory next to the toolchain.
    pub fn bundle(&self, name: &str) -> PathBuf {
        let app = self.root.path().join("build").join(name);
        std::fs::create_dir_all(app.join("Contents/MacOS")).expect("create bundle");
        std::fs::write(app.join("Contents/MacOS/app"), b"\xcf\xfa\xed\xfe").expect("write binary");
        app
    }

    /// Recorded invocations, oldest first; each starts with the tool name.
    pub fn calls(&self) -> Vec<Vec<String>> {
        match std::fs::read_to_string(&self.log) {
            Ok(content) => content
                .lines()
                .map(|line| line.split('\t').map(str::to_string).collect())
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => panic!("read spy log: {e}"),
        }
    }

    /// Tool names of recorded invocations, using the subcommand for `xcrun`.
    pub fn call_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| match call[0].as_str() {
                "xcrun" => call.get(1).cloned().unwrap_or_default(),
                _ => call[0].clone(),
            })
            .collect()
    }

    /// Entitlements files as `codesign` saw them, one per signing run.
    pub fn captured_entitlements(&self) -> Vec<String> {
        let mut captured = Vec::new();
        for entry in std::fs::read_dir(&self.spy).expect("read spy dir") {
            let path = entry.expect("spy entry").path();
            let is_entitlements = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("entitlements-"));
            if is_entitlements {
                captured.push(std::fs::read_to_string(&path).expect("read entitlements"));
            }
        }
        captured
    }

    pub fn leftover_work_dirs(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.work_root)
            .expect("read work root")
            .map(|entry| entry.expect("work root entry").path())
            .collect()
    }
}

/// Progress output whose contents stay readable after the run.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn boxed(&self) -> ProgressOutput {
        Box::new(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("sink lock")).into_owned()
    }
}

impl AsyncWrite for SharedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().expect("sink lock").extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Progress output that panics on first write.
pub struct PanickingSink;

impl AsyncWrite for PanickingSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        panic!("progress sink exploded");
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Progress output whose reader has gone away; every write fails.
pub struct ClosedSink;

impl AsyncWrite for ClosedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "progress reader went away",
        )))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn write_script(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, content).expect("write fake tool");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake tool");
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
