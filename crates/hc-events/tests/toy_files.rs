use hc_core::{Event, EventSource};
use hc_events::{EventChain, ToyClass, ToyConfig, ToySource, read_all, write_events};

fn tmp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("hc_events_it_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(seed: u64) -> ToyConfig {
    ToyConfig {
        classes: vec![
            ToyClass { lo: 0.0, hi: 5.0, mult_charged: 20.0 },
            ToyClass { lo: 5.0, hi: 10.0, mult_charged: 10.0 },
        ],
        events_per_percent: 3.0,
        seed,
        ..ToyConfig::default()
    }
}

fn drain(mut src: impl EventSource) -> Vec<Event> {
    let mut out = Vec::new();
    let mut buf = Event::default();
    while src.next_event(&mut buf).unwrap() {
        out.push(buf.clone());
    }
    out
}

#[test]
fn toy_events_survive_a_file_roundtrip() {
    let dir = tmp_dir("roundtrip");
    let path = dir.join("fist_run_0.jsonl");
    let n = write_events(&mut ToySource::new(config(1)).unwrap(), &path).unwrap();
    assert_eq!(n, 30);

    let expected = drain(ToySource::new(config(1)).unwrap());
    assert_eq!(read_all(&path).unwrap(), expected);
}

#[test]
fn chain_concatenates_discovered_runs() {
    let dir = tmp_dir("chain");
    for seed in [0u64, 1] {
        let path = dir.join(format!("fist_run_{seed}.jsonl"));
        write_events(&mut ToySource::new(config(seed)).unwrap(), &path).unwrap();
    }
    std::fs::write(dir.join("README"), "not events").unwrap();

    let chain = EventChain::from_dir(&dir, "fist_run").unwrap();
    assert_eq!(chain.files().len(), 2);

    let mut expected = drain(ToySource::new(config(0)).unwrap());
    expected.extend(drain(ToySource::new(config(1)).unwrap()));
    assert_eq!(drain(chain), expected);
}
