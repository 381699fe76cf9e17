//! DHAT heap profiler for svg-stream.
//!
//! Profiles allocation patterns across the dispatch pipeline:
//! policy -> parse -> dispatch -> shapes/viewports.
//!
//! Usage:
//!   cargo run -p svg-stream-heap-profile --release -- [OPTIONS] [SVG_FILES...]
//!
//! Outputs dhat-<phase>.json files in the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};

use svg_stream::{
    AttributeTag, BasicShape, BasicShapesPolicy, ComputedViewport, Context, DispatchConfig,
    DocumentDriver, DomainValue, PathCommand, Policy, Transform, ValueSource, ViewportMode,
};

const DEFAULT_FIXTURES: &[&str] = &["tests/fixtures/icons.svg", "tests/fixtures/symbols.svg"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Policy,
    Parse,
    Shapes,
    Viewport,
    Full,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "policy" => Some(Self::Policy),
            "parse" => Some(Self::Parse),
            "shapes" => Some(Self::Shapes),
            "viewport" => Some(Self::Viewport),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Parse => "parse",
            Self::Shapes => "shapes",
            Self::Viewport => "viewport",
            Self::Full => "full",
        }
    }

    fn config(self) -> DispatchConfig {
        let config = DispatchConfig::new();
        match self {
            Self::Policy | Self::Parse => config,
            Self::Shapes => config.with_basic_shapes(BasicShapesPolicy::convert_all()),
            Self::Viewport => config.with_viewport(ViewportMode::Calculate),
            Self::Full => config
                .with_basic_shapes(BasicShapesPolicy::convert_all())
                .with_viewport(ViewportMode::AsTransform),
        }
    }
}

/// Drops every output so only the pipeline's own allocations show up.
struct Sink {
    outputs: usize,
}

impl Context for Sink {
    fn set_value(&mut self, _tag: AttributeTag, _value: DomainValue<'_>, _source: ValueSource) {
        self.outputs += 1;
    }

    fn path_command(&mut self, _command: PathCommand) {
        self.outputs += 1;
    }

    fn transform(&mut self, _transform: Transform) {
        self.outputs += 1;
    }

    fn viewport(&mut self, _viewport: ComputedViewport) {
        self.outputs += 1;
    }

    fn shape(&mut self, _shape: BasicShape) {
        self.outputs += 1;
    }
}

fn profile_file(path: &Path, phase: Phase) {
    let path_str = path.to_string_lossy();
    let policy =
        Policy::new(phase.config()).unwrap_or_else(|e| panic!("policy {}: {}", path_str, e));
    if phase == Phase::Policy {
        return;
    }

    let bytes = std::fs::read(path).unwrap_or_else(|e| panic!("read {}: {}", path_str, e));
    let mut sink = Sink { outputs: 0 };
    DocumentDriver::new(&policy)
        .with_abort_on_element_error(false)
        .dispatch_document(&bytes, &mut sink)
        .unwrap_or_else(|e| panic!("dispatch {}: {}", path_str, e));
    if sink.outputs == 0 {
        panic!("{} produced no outputs", path_str);
    }
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [SVG_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --phase <policy|parse|shapes|viewport|full>  Pipeline phase to profile (default: full)"
    );
    eprintln!("  --out-dir <DIR>                      Output directory for dhat JSON (default: target/memory)");
    eprintln!();
    eprintln!("All files share one profile per run.");
    eprintln!("If no SVG files are given, profiles the test fixtures.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Full;
    let mut out_dir = PathBuf::from("target/memory");
    let mut files: Vec<PathBuf> = Vec::with_capacity(8);
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                phase = args
                    .get(i)
                    .and_then(|name| Phase::from_str(name))
                    .unwrap_or_else(|| {
                        eprintln!("Unknown phase: {}", args.get(i).map_or("", String::as_str));
                        usage();
                        std::process::exit(1);
                    });
            }
            "--out-dir" => {
                i += 1;
                let Some(dir) = args.get(i) else {
                    usage();
                    std::process::exit(1);
                };
                out_dir = PathBuf::from(dir);
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => files.push(PathBuf::from(other)),
        }
        i += 1;
    }

    if files.is_empty() {
        files.extend(
            DEFAULT_FIXTURES
                .iter()
                .map(PathBuf::from)
                .filter(|p| p.exists()),
        );
    }
    if files.is_empty() {
        eprintln!("No SVG files found. Provide paths or ensure test fixtures exist.");
        std::process::exit(1);
    }

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let json_path = out_dir.join(format!("dhat-{}.json", phase.name()));
    eprintln!(
        "heap-profile: phase={}, files={}, out={}",
        phase.name(),
        files.len(),
        out_dir.display()
    );

    let _profiler = dhat::Profiler::builder()
        .file_name(json_path.clone())
        .build();

    for file in &files {
        eprintln!("  profiling: {}", file.display());
        profile_file(file, phase);
    }

    // _profiler drops here, writes JSON
    eprintln!(
        "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
        json_path.display()
    );
}
