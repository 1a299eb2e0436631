//! Property-based tests for the search primitive and both stages.

use interp_extern::buffer::{Interval, Region, View, ViewMut};
use interp_extern::search::lower_bound;
use interp_extern::stage::{
    interp_clamped, ExternStage, IndexLocator, InterpInputs, InterpSettings, LocateInputs,
    LocateSettings, PiecewiseInterp,
};

use proptest::prelude::*;

/// Strictly increasing table built from a start point and positive steps.
fn increasing_table(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (-100.0f64..100.0, prop::collection::vec(0.01f64..10.0, 0..max_len)).prop_map(|(start, steps)| {
        let mut xs = Vec::with_capacity(steps.len() + 1);
        let mut x = start;
        xs.push(x);
        for s in steps {
            x += s;
            xs.push(x);
        }
        xs
    })
}

fn region2(x: (i32, i32), y: (i32, i32)) -> Region<2> {
    Region::new([Interval::new(x.0, x.1), Interval::new(y.0, y.1)])
}

proptest! {
    #[test]
    fn lower_bound_postcondition(xs in increasing_table(64), q in -200.0f64..800.0) {
        let i = lower_bound(&xs, q);
        prop_assert!(i <= xs.len());
        prop_assert!(i == 0 || xs[i - 1] < q, "xs[{}] = {} >= {}", i - 1, xs[i - 1], q);
        prop_assert!(i == xs.len() || q <= xs[i]);
    }

    #[test]
    fn lower_bound_of_table_entries(xs in increasing_table(64)) {
        for (i, &x) in xs.iter().enumerate() {
            prop_assert_eq!(lower_bound(&xs, x), i);
        }
    }

    #[test]
    fn locator_matches_search(
        xs in increasing_table(32),
        queries in prop::collection::vec(-200.0f64..600.0, 1..24),
    ) {
        let n = xs.len() as i32;
        let stage = IndexLocator::new(LocateSettings::new(n)).unwrap();
        let out_region = region2((0, queries.len() as i32), (0, 1));
        let mut out = vec![0_i32; queries.len()];
        let inputs = LocateInputs {
            queries: View::dense(&queries, out_region).unwrap(),
            table: View::dense(&xs, Region::new([Interval::new(0, n)])).unwrap(),
        };
        stage.compute(inputs, ViewMut::dense(&mut out, out_region).unwrap()).unwrap();
        for (q, &idx) in queries.iter().zip(out.iter()) {
            prop_assert_eq!(idx as usize, lower_bound(&xs, *q));
        }
    }

    #[test]
    fn interpolation_bracketed_by_ordinates(
        xs in increasing_table(32),
        seed in -50.0f64..50.0,
        q in -200.0f64..600.0,
    ) {
        let fp: Vec<f64> = xs.iter().enumerate().map(|(i, _)| seed + (i as f64 * 1.7).sin() * 10.0).collect();
        let v = interp_clamped(&xs, &fp, q);
        let i = lower_bound(&xs, q);
        let (lo, hi) = if i == 0 {
            (fp[0], fp[0])
        } else if i == xs.len() {
            (fp[xs.len() - 1], fp[xs.len() - 1])
        } else {
            (fp[i - 1].min(fp[i]), fp[i - 1].max(fp[i]))
        };
        prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "{} not in [{}, {}]", v, lo, hi);
    }

    #[test]
    fn interp_stage_rows_independent(
        xs in increasing_table(16),
        queries in prop::collection::vec(-150.0f64..300.0, 1..8),
        rows in 2usize..5,
        noise in -1000.0f64..1000.0,
    ) {
        let n = xs.len() as i32;
        let cols = queries.len() as i32;
        let stage = PiecewiseInterp::new(InterpSettings::new(n)).unwrap();
        let out_region = region2((0, cols), (0, rows as i32));
        let b = stage.negotiate(&out_region);

        // Same query row repeated for every batch row
        let q: Vec<f64> = (0..rows).flat_map(|_| queries.iter().copied()).collect();
        let base: Vec<f64> = (0..rows * xs.len()).map(|k| (k as f64 * 0.37).cos()).collect();
        let mut perturbed = base.clone();
        // Change every row except the first
        for v in perturbed.iter_mut().skip(xs.len()) {
            *v += noise;
        }

        let run = |fp: &[f64]| {
            let mut out = vec![0.0; q.len()];
            let inputs = InterpInputs {
                queries: View::dense(&q, b.queries).unwrap(),
                xp: View::dense(&xs, b.xp).unwrap(),
                fp: View::dense(fp, b.fp).unwrap(),
            };
            stage.compute(inputs, ViewMut::dense(&mut out, out_region).unwrap()).unwrap();
            out
        };
        let a = run(&base[..]);
        let c = run(&perturbed[..]);
        prop_assert_eq!(&a[..queries.len()], &c[..queries.len()]);

        // Every row matches the slice reference
        for y in 0..rows {
            let row = &base[y * xs.len()..(y + 1) * xs.len()];
            for (x, &qv) in queries.iter().enumerate() {
                let want = interp_clamped(&xs, row, qv);
                let got = a[y * queries.len() + x];
                prop_assert!((got - want).abs() <= 1e-12 * want.abs().max(1.0));
            }
        }
    }

    #[test]
    fn negotiation_idempotent(
        x0 in -100i32..100, w in 0i32..64,
        y0 in -10i32..10, h in 0i32..8,
        n in 1i32..1024,
    ) {
        let stage = PiecewiseInterp::new(InterpSettings::new(n)).unwrap();
        let out = region2((x0, w), (y0, h));
        let first = stage.negotiate(&out);
        prop_assert_eq!(stage.negotiate(&out), first);
        prop_assert_eq!(first.queries, out);
        prop_assert_eq!(first.xp, Region::new([Interval::new(0, n)]));
        prop_assert_eq!(first.fp, region2((0, n), (y0, h)));
    }
}
