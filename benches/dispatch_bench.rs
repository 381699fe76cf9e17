use std::hint::black_box;
use std::time::Instant;

use svg_stream::{
    parse_value, resolve_attribute, AttributeTag, BasicShapesPolicy, DispatchConfig,
    DocumentDriver, ElementKind, Policy, Recorder, ValueSource, ViewportMode,
};

#[path = "../tests/common/budget_alloc.rs"]
#[allow(dead_code)]
mod budget_alloc;
#[path = "../tests/common/fixtures.rs"]
#[allow(dead_code)]
mod fixtures;

use budget_alloc::BudgetAlloc;
use fixtures::{read_fixture, synthetic_document, ICONS_FIXTURE, SYMBOLS_FIXTURE};

#[global_allocator]
static ALLOC: BudgetAlloc = BudgetAlloc::new();

const FIXTURES: &[(&str, &str)] = &[("icons", ICONS_FIXTURE), ("symbols", SYMBOLS_FIXTURE)];

const SYNTHETIC_ROWS: usize = 2_000;

const LONG_PATH: &str = "M10 80 C 40 10, 65 10, 95 80 S 150 150, 180 80 \
    Q 200 40 220 80 T 260 80 A 20 20 0 0 1 300 80 L 300 120 H 10 V 80 z \
    m 5 5 l 10 0 l 0 10 l -10 0 z";

const CSV_HEADER: &str =
    "fixture,case,iterations,min_ns,median_ns,max_ns,median_peak_heap_bytes,max_peak_heap_bytes";

/// Sorted samples of one measured quantity.
struct Samples<T>(Vec<T>);

impl<T: Copy + Ord> Samples<T> {
    fn sorted(mut values: Vec<T>) -> Self {
        values.sort_unstable();
        Self(values)
    }

    fn min(&self) -> T {
        self.0[0]
    }

    fn median(&self) -> T {
        self.0[self.0.len() / 2]
    }

    fn max(&self) -> T {
        self.0[self.0.len() - 1]
    }
}

struct Measurement {
    fixture: String,
    case: &'static str,
    nanos: Samples<u128>,
    peak_heap: Samples<usize>,
}

impl Measurement {
    fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.fixture,
            self.case,
            self.nanos.0.len(),
            self.nanos.min(),
            self.nanos.median(),
            self.nanos.max(),
            self.peak_heap.median(),
            self.peak_heap.max()
        )
    }
}

#[derive(Clone, Copy)]
struct Iterations {
    warmup: usize,
    measure: usize,
}

/// Time `op` and record the heap it peaks at above what was already live.
fn measure(
    fixture: &str,
    case: &'static str,
    iters: Iterations,
    mut op: impl FnMut() -> usize,
) -> Measurement {
    for _ in 0..iters.warmup {
        black_box(op());
    }

    let mut nanos = Vec::with_capacity(iters.measure);
    let mut peak_heap = Vec::with_capacity(iters.measure);
    for _ in 0..iters.measure {
        let live = ALLOC.current_bytes();
        ALLOC.reset_peak();
        let start = Instant::now();
        black_box(op());
        nanos.push(start.elapsed().as_nanos());
        peak_heap.push(ALLOC.peak_bytes().saturating_sub(live));
    }

    Measurement {
        fixture: fixture.to_string(),
        case,
        nanos: Samples::sorted(nanos),
        peak_heap: Samples::sorted(peak_heap),
    }
}

fn dispatch_cases(results: &mut Vec<Measurement>, fixture: &str, bytes: &[u8], iters: Iterations) {
    let passthrough = Policy::new(DispatchConfig::new()).unwrap_or_else(|e| panic!("{}", e));
    let converting = Policy::new(
        DispatchConfig::new()
            .with_viewport(ViewportMode::AsTransform)
            .with_basic_shapes(BasicShapesPolicy::convert_all()),
    )
    .unwrap_or_else(|e| panic!("{}", e));

    for (case, policy) in [
        ("dispatch_parsed", &passthrough),
        ("dispatch_shapes_to_path", &converting),
    ] {
        results.push(measure(fixture, case, iters, || {
            let mut recorder = Recorder::new();
            DocumentDriver::new(policy)
                .dispatch_document(bytes, &mut recorder)
                .unwrap_or_else(|e| panic!("dispatch failed: {}", e));
            recorder.outputs.len()
        }));
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let iters = if quick {
        Iterations {
            warmup: 1,
            measure: 5,
        }
    } else {
        Iterations {
            warmup: 3,
            measure: 25,
        }
    };

    println!("# svg-stream benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        iters.warmup,
        iters.measure
    );
    println!("{}", CSV_HEADER);

    let mut results = vec![
        measure("-", "policy_build", iters, || {
            let policy = Policy::new(DispatchConfig::new().with_viewport(ViewportMode::Calculate))
                .unwrap_or_else(|e| panic!("policy failed: {}", e));
            policy.states_for(ElementKind::Svg).len()
        }),
        measure("-", "resolve_attributes", iters, || {
            ElementKind::ALL
                .iter()
                .flat_map(|&kind| {
                    AttributeTag::ALL.iter().filter(move |tag| {
                        resolve_attribute(kind, ValueSource::Attribute, tag.name()).is_some()
                    })
                })
                .count()
        }),
        measure("-", "parse_path_data", iters, || {
            match parse_value(ElementKind::Path, AttributeTag::D, LONG_PATH) {
                Ok(svg_stream::DomainValue::Path(commands)) => commands.len(),
                _ => 0,
            }
        }),
    ];

    for (fixture, path) in FIXTURES {
        dispatch_cases(&mut results, fixture, &read_fixture(path), iters);
    }
    let synthetic = synthetic_document(SYNTHETIC_ROWS);
    dispatch_cases(&mut results, "synthetic", synthetic.as_bytes(), iters);

    for result in &results {
        println!("{}", result.csv_row());
    }
}
