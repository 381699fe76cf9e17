//! Command-line front end: dispatch one SVG file and print every output.
//!
//! Usage:
//!   cargo run --features cli -- [OPTIONS] <FILE.svg>

use std::path::PathBuf;
use std::process::ExitCode;

use svg_stream::{
    BasicShapesPolicy, DefaultErrorPolicy, DispatchConfig, DocumentDriver, ElementKind,
    ErrorPolicy, LenientErrorPolicy, Policy, Recorder, Size, StrictErrorPolicy, ViewportMode,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Strictness {
    Default,
    Strict,
    Lenient,
}

struct Options {
    file: PathBuf,
    shapes_to_path: bool,
    rounded_only: bool,
    collect_shapes: bool,
    viewport: ViewportMode,
    strictness: Strictness,
    reference_size: Option<Size>,
    keep_going: bool,
}

fn usage() {
    eprintln!("Usage: svg-stream [OPTIONS] <FILE.svg>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --shapes-to-path        Convert basic shapes into path commands");
    eprintln!("  --rounded-only          With --shapes-to-path, only convert rounded rects");
    eprintln!("  --collect-shapes        Emit basic shapes as collected geometry");
    eprintln!("  --viewport-rect         Compute svg/symbol viewports");
    eprintln!("  --viewport-transform    Turn svg/symbol viewports into transforms");
    eprintln!("  --reference <W>x<H>     Size of the referencing <use> element");
    eprintln!("  --strict                Fail on unknown attributes");
    eprintln!("  --lenient               Drop attributes whose values fail to parse");
    eprintln!("  --keep-going            Count failing elements instead of aborting");
}

fn parse_size(text: &str) -> Option<Size> {
    let (w, h) = text.split_once(['x', 'X'])?;
    let width = w.trim().parse::<f64>().ok()?;
    let height = h.trim().parse::<f64>().ok()?;
    Some(Size::new(width, height))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut file = None;
    let mut options = Options {
        file: PathBuf::new(),
        shapes_to_path: false,
        rounded_only: false,
        collect_shapes: false,
        viewport: ViewportMode::Passthrough,
        strictness: Strictness::Default,
        reference_size: None,
        keep_going: false,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--shapes-to-path" => options.shapes_to_path = true,
            "--rounded-only" => options.rounded_only = true,
            "--collect-shapes" => options.collect_shapes = true,
            "--viewport-rect" => options.viewport = ViewportMode::Calculate,
            "--viewport-transform" => options.viewport = ViewportMode::AsTransform,
            "--strict" => options.strictness = Strictness::Strict,
            "--lenient" => options.strictness = Strictness::Lenient,
            "--keep-going" => options.keep_going = true,
            "--reference" => {
                i += 1;
                let value = args.get(i).ok_or("--reference needs a value")?;
                options.reference_size =
                    Some(parse_size(value).ok_or_else(|| format!("bad size: {value}"))?);
            }
            other if other.starts_with("--") => return Err(format!("unknown option: {other}")),
            other => {
                if file.replace(PathBuf::from(other)).is_some() {
                    return Err("expected exactly one input file".to_string());
                }
            }
        }
        i += 1;
    }
    options.file = file.ok_or("missing input file")?;
    Ok(options)
}

fn build_config(options: &Options) -> DispatchConfig {
    let mut shapes = BasicShapesPolicy::default();
    if options.shapes_to_path {
        shapes.convert_to_path = BasicShapesPolicy::convert_all().convert_to_path;
        shapes.convert_only_rounded_rect_to_path = options.rounded_only;
    }
    if options.collect_shapes || options.rounded_only {
        shapes.collect_attributes = BasicShapesPolicy::collect_all().collect_attributes;
    }
    let mut config = DispatchConfig::new()
        .with_basic_shapes(shapes)
        .with_viewport(options.viewport);
    if options.reference_size.is_some() {
        config = config.with_referencing_element(ElementKind::Use);
    }
    config
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
        return ExitCode::SUCCESS;
    }
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            usage();
            return ExitCode::from(2);
        }
    };

    let bytes = match std::fs::read(&options.file) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {}", options.file.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let policy = match Policy::new(build_config(&options)) {
        Ok(policy) => policy,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let error_policy: &dyn ErrorPolicy = match options.strictness {
        Strictness::Default => &DefaultErrorPolicy,
        Strictness::Strict => &StrictErrorPolicy,
        Strictness::Lenient => &LenientErrorPolicy,
    };
    let mut driver = DocumentDriver::new(&policy)
        .with_error_policy(error_policy)
        .with_abort_on_element_error(!options.keep_going);
    if let Some(size) = options.reference_size {
        driver = driver.with_reference_size(size);
    }

    let mut recorder = Recorder::new();
    let result = driver.dispatch_document(&bytes, &mut recorder);
    for output in &recorder.outputs {
        println!("{output}");
    }
    match result {
        Ok(summary) => {
            eprintln!(
                "{}: elements={} attributes={} skipped={} failed={}",
                options.file.display(),
                summary.elements,
                summary.attributes,
                summary.skipped_elements,
                summary.failed_elements
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", options.file.display(), err);
            ExitCode::FAILURE
        }
    }
}
