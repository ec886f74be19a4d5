//! Comprehensive unit tests for rastercube modules
//!
//! These tests provide extensive coverage of the core functionality
//! to ensure reliability and prevent regressions.

use chrono::{TimeZone, Utc};
use rastercube::{
    calendar::{self, Period},
    errors::CubeError,
    reducers::Reducer,
    temporal::{self, TemporalKind},
    validation::{check_parameter, ParamSpec, ParamType},
    view::{row_major_coords, row_major_strides, StridedView},
};
use serde_json::json;

#[test]
fn test_error_types() {
    let dim_err = CubeError::DimensionNotAvailable {
        dim: "bands".to_string(),
    };
    assert_eq!(dim_err.kind(), "DimensionNotAvailable");
    assert!(format!("{}", dim_err).contains("Dimension 'bands' is not available"));

    let period_err = CubeError::UnknownPeriod {
        period: "fortnight".to_string(),
    };
    assert_eq!(period_err.kind(), "UnknownPeriod");
    assert!(format!("{}", period_err).contains("fortnight"));

    let resolver_err = CubeError::OverlapResolverMissing;
    assert_eq!(resolver_err.kind(), "OverlapResolverMissing");
    assert!(format!("{}", resolver_err).contains("no overlap resolver"));

    let internal_err = CubeError::Internal("only one dimension may differ".to_string());
    assert_eq!(internal_err.kind(), "Internal");
    assert_eq!(format!("{}", internal_err), "only one dimension may differ");
}

#[test]
fn test_row_major_strides() {
    assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
    assert_eq!(row_major_strides(&[5]), vec![1]);
    assert_eq!(row_major_strides(&[]), Vec::<isize>::new());
}

#[test]
fn test_row_major_round_trip() {
    // Default row-major view reproduces the buffer exactly
    let data: Vec<f64> = (0..24).map(f64::from).collect();
    let view = StridedView::from_shape(data.clone(), vec![2, 3, 4]);

    let mut seen = Vec::new();
    for coord in row_major_coords(vec![2, 3, 4]) {
        seen.push(view.get(&coord));
    }
    assert_eq!(seen, data);
    assert_eq!(view.to_vec(), data);
}

#[test]
fn test_row_major_coords_rank_zero() {
    let coords: Vec<Vec<usize>> = row_major_coords(Vec::new()).collect();
    assert_eq!(coords, vec![Vec::<usize>::new()]);

    // A zero-length axis yields no coordinates at all
    let empty: Vec<Vec<usize>> = row_major_coords(vec![2, 0]).collect();
    assert!(empty.is_empty());
}

#[test]
fn test_pick_matches_get() {
    let data: Vec<f64> = (0..24).map(f64::from).collect();
    let view = StridedView::from_shape(data, vec![2, 3, 4]);

    let picked = view.pick(&[Some(1), None, Some(2)]);
    assert_eq!(picked.shape(), &[3]);
    for j in 0..3 {
        assert_eq!(picked.get(&[j]), view.get(&[1, j, 2]));
    }

    // Missing trailing entries keep their axes
    let row = view.pick(&[Some(0)]);
    assert_eq!(row.shape(), &[3, 4]);
    assert_eq!(row.get(&[2, 3]), view.get(&[0, 2, 3]));
}

#[test]
fn test_transpose_inverse_restores_layout() {
    let data: Vec<f64> = (0..24).map(f64::from).collect();
    let view = StridedView::from_shape(data, vec![2, 3, 4]);

    let transposed = view.transpose(&[2, 0, 1]);
    assert_eq!(transposed.shape(), &[4, 2, 3]);
    assert_eq!(transposed.get(&[3, 1, 2]), view.get(&[1, 2, 3]));

    let back = transposed.transpose(&[1, 2, 0]);
    assert_eq!(back.shape(), view.shape());
    assert_eq!(back.stride(), view.stride());
    assert_eq!(back.offset(), view.offset());

    // Unspecified trailing axes default to their own index
    let identity = view.transpose(&[]);
    assert_eq!(identity.shape(), view.shape());
    assert_eq!(identity.stride(), view.stride());
}

#[test]
fn test_lo_hi_window() {
    let data: Vec<f64> = (0..10).map(f64::from).collect();
    let view = StridedView::from_vec(data);

    let tail = view.lo(&[Some(3)]);
    assert_eq!(tail.shape(), &[7]);
    assert_eq!(tail.get(&[0]), 3.0);

    let head = view.hi(&[Some(5)]);
    assert_eq!(head.shape(), &[5]);
    assert_eq!(head.get(&[4]), 4.0);

    let window = view.lo(&[Some(2)]).hi(&[Some(4)]);
    assert_eq!(window.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);

    // None is a no-op for that axis
    let unchanged = view.lo(&[None]).hi(&[None]);
    assert_eq!(unchanged.to_vec(), view.to_vec());
}

#[test]
fn test_step_resamples_and_reverses() {
    let view = StridedView::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

    let every_other = view.step(&[Some(2)]);
    assert_eq!(every_other.to_vec(), vec![1.0, 3.0, 5.0]);

    let reversed = view.step(&[Some(-1)]);
    assert_eq!(reversed.to_vec(), vec![5.0, 4.0, 3.0, 2.0, 1.0]);
    assert_eq!(reversed.offset(), 4);

    let reversed_pairs = view.step(&[Some(-2)]);
    assert_eq!(reversed_pairs.to_vec(), vec![5.0, 3.0, 1.0]);

    // 0 and None keep the axis unchanged
    assert_eq!(view.step(&[Some(0)]).to_vec(), view.to_vec());
    assert_eq!(view.step(&[None]).to_vec(), view.to_vec());
}

#[test]
fn test_order_and_contiguity() {
    let data: Vec<f64> = (0..24).map(f64::from).collect();
    let view = StridedView::from_shape(data, vec![2, 3, 4]);
    assert_eq!(view.order(), vec![2, 1, 0]);
    assert!(view.is_contiguous());

    let transposed = view.transpose(&[2, 0, 1]);
    assert_eq!(transposed.order(), vec![0, 2, 1]);
    assert!(transposed.is_contiguous());

    let strided = view.step(&[None, None, Some(2)]);
    assert!(!strided.is_contiguous());
}

#[test]
fn test_views_alias_one_buffer() {
    let view = StridedView::from_shape(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let row = view.pick(&[Some(1), None]);
    assert!(row.shares_buffer_with(&view));

    row.set(&[0], 9.0);
    assert_eq!(view.get(&[1, 0]), 9.0);

    // Materializing breaks the aliasing
    let copy = view.materialize();
    assert!(!copy.shares_buffer_with(&view));
    copy.set(&[0, 0], -1.0);
    assert_eq!(view.get(&[0, 0]), 1.0);
}

#[test]
fn test_negative_stride_offset_adjustment() {
    let view = StridedView::from_vec(vec![1.0, 2.0, 3.0]);
    let reversed = StridedView::from_parts(view.buffer(), vec![3], Some(vec![-1]), None);
    assert_eq!(reversed.offset(), 2);
    assert_eq!(reversed.to_vec(), vec![3.0, 2.0, 1.0]);
}

#[test]
fn test_broadcast_to() {
    let view = StridedView::from_vec(vec![1.0, 2.0, 3.0]);
    let wide = view.broadcast_to(&[2, 3]).expect("broadcast should succeed");
    assert_eq!(wide.to_vec(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    assert!(wide.shares_buffer_with(&view));

    let single = StridedView::from_shape(vec![7.0], vec![1]);
    assert_eq!(single.broadcast_to(&[3]).unwrap().to_vec(), vec![7.0, 7.0, 7.0]);

    let incompatible = view.broadcast_to(&[2, 4]);
    assert!(incompatible.is_err());
}

#[test]
fn test_scalar_view() {
    let scalar = StridedView::from_scalar(42.0);
    assert_eq!(scalar.ndim(), 0);
    assert_eq!(scalar.len(), 1);
    assert_eq!(scalar.get(&[]), 42.0);
    assert_eq!(scalar.to_vec(), vec![42.0]);
}

#[test]
fn test_period_parsing() {
    assert_eq!("month".parse::<Period>().unwrap(), Period::Month);
    assert_eq!(
        "tropical-season".parse::<Period>().unwrap(),
        Period::TropicalSeason
    );
    assert_eq!(Period::DecadeAd.as_str(), "decade-ad");

    match "fortnight".parse::<Period>() {
        Err(CubeError::UnknownPeriod { period }) => assert_eq!(period, "fortnight"),
        other => panic!("Expected UnknownPeriod, got {:?}", other),
    }
}

#[test]
fn test_period_labels() {
    let ts = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap();

    assert_eq!(calendar::label_of(Period::Hour, ts(2021, 1, 15, 7)), "2021-01-15-07");
    assert_eq!(calendar::label_of(Period::Day, ts(2021, 2, 1, 0)), "2021-032");
    // Weeks count ceil(day-of-year / 7) within the timestamp's own year,
    // so January 1st is always week 01 of its own year
    assert_eq!(calendar::label_of(Period::Week, ts(2021, 1, 1, 0)), "2021-01");
    assert_eq!(calendar::label_of(Period::Week, ts(2021, 1, 8, 0)), "2021-02");
    assert_eq!(calendar::label_of(Period::Week, ts(2021, 12, 31, 0)), "2021-53");
    assert_eq!(calendar::label_of(Period::Dekad, ts(2021, 1, 5, 0)), "2021-01-01");
    assert_eq!(calendar::label_of(Period::Dekad, ts(2021, 1, 15, 0)), "2021-01-02");
    assert_eq!(calendar::label_of(Period::Dekad, ts(2021, 1, 25, 0)), "2021-01-03");
    assert_eq!(calendar::label_of(Period::Month, ts(2021, 1, 15, 0)), "2021-01");
    // Every month keeps its own calendar year, so January and December of
    // one year share a djf label
    assert_eq!(calendar::label_of(Period::Season, ts(2020, 12, 10, 0)), "2020-djf");
    assert_eq!(calendar::label_of(Period::Season, ts(2021, 1, 10, 0)), "2021-djf");
    assert_eq!(calendar::label_of(Period::Season, ts(2021, 2, 28, 0)), "2021-djf");
    assert_eq!(calendar::label_of(Period::Season, ts(2021, 4, 10, 0)), "2021-mam");
    assert_eq!(calendar::label_of(Period::Season, ts(2021, 7, 10, 0)), "2021-jja");
    assert_eq!(calendar::label_of(Period::Season, ts(2021, 10, 10, 0)), "2021-son");
    assert_eq!(
        calendar::label_of(Period::TropicalSeason, ts(2021, 2, 1, 0)),
        "2021-ndjfma"
    );
    assert_eq!(
        calendar::label_of(Period::TropicalSeason, ts(2021, 6, 1, 0)),
        "2021-mjjaso"
    );
    assert_eq!(
        calendar::label_of(Period::TropicalSeason, ts(2021, 11, 5, 0)),
        "2021-ndjfma"
    );
    assert_eq!(calendar::label_of(Period::Year, ts(2021, 5, 1, 0)), "2021");
    assert_eq!(calendar::label_of(Period::Decade, ts(2025, 5, 1, 0)), "2020");
    assert_eq!(calendar::label_of(Period::DecadeAd, ts(2020, 5, 1, 0)), "2011");
    assert_eq!(calendar::label_of(Period::DecadeAd, ts(2021, 5, 1, 0)), "2021");
}

#[test]
fn test_period_advance() {
    let ts = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();

    assert_eq!(calendar::advance(Period::Day, ts(2021, 12, 31)), ts(2022, 1, 1));
    assert_eq!(calendar::advance(Period::Week, ts(2021, 1, 1)), ts(2021, 1, 8));

    // Dekad jumps to day 1 of the next month past day 20, otherwise +10 days
    assert_eq!(calendar::advance(Period::Dekad, ts(2021, 1, 5)), ts(2021, 1, 15));
    assert_eq!(calendar::advance(Period::Dekad, ts(2021, 1, 25)), ts(2021, 2, 1));

    // Calendar arithmetic, not fixed durations
    assert_eq!(calendar::advance(Period::Month, ts(2021, 1, 31)), ts(2021, 2, 28));
    assert_eq!(calendar::advance(Period::Season, ts(2021, 1, 1)), ts(2021, 4, 1));
    assert_eq!(calendar::advance(Period::Year, ts(2020, 2, 29)), ts(2021, 2, 28));
    assert_eq!(calendar::advance(Period::Decade, ts(2020, 6, 15)), ts(2030, 6, 15));
}

#[test]
fn test_generate_range_includes_first_exceeding() {
    let ts = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
    let range = calendar::generate_range(ts(2021, 1, 1), ts(2021, 2, 15), Period::Month);
    assert_eq!(range, vec![ts(2021, 1, 1), ts(2021, 2, 1), ts(2021, 3, 1)]);

    // min > max still yields the starting point
    let degenerate = calendar::generate_range(ts(2021, 3, 1), ts(2021, 1, 1), Period::Month);
    assert_eq!(degenerate, vec![ts(2021, 3, 1)]);
}

#[test]
fn test_temporal_parsing() {
    let date = temporal::parse_temporal("2021-01-15").unwrap();
    assert_eq!(date.kind, TemporalKind::Date);
    assert_eq!(date.instant, Utc.with_ymd_and_hms(2021, 1, 15, 0, 0, 0).unwrap());

    let datetime = temporal::parse_temporal("2021-01-15T12:30:00Z").unwrap();
    assert_eq!(datetime.kind, TemporalKind::DateTime);
    assert_eq!(
        datetime.instant,
        Utc.with_ymd_and_hms(2021, 1, 15, 12, 30, 0).unwrap()
    );

    // Offsets normalize to UTC
    let offset = temporal::parse_temporal("2021-01-15T12:30:00+02:00").unwrap();
    assert_eq!(
        offset.instant,
        Utc.with_ymd_and_hms(2021, 1, 15, 10, 30, 0).unwrap()
    );

    let time = temporal::parse_temporal("12:30:00Z").unwrap();
    assert_eq!(time.kind, TemporalKind::Time);
    assert_eq!(time.instant, Utc.with_ymd_and_hms(1970, 1, 1, 12, 30, 0).unwrap());

    match temporal::parse_temporal("not-a-date") {
        Err(CubeError::InvalidTemporalString { value }) => assert_eq!(value, "not-a-date"),
        other => panic!("Expected InvalidTemporalString, got {:?}", other),
    }
}

#[test]
fn test_extent_parsing_and_membership() {
    // A fully open extent is invalid
    match temporal::parse_extent((None, None)) {
        Err(CubeError::InvalidExtent { .. }) => {}
        other => panic!("Expected InvalidExtent, got {:?}", other),
    }

    match temporal::parse_extent((Some("bogus"), None)) {
        Err(CubeError::InvalidExtent { message }) => assert!(message.contains("bogus")),
        other => panic!("Expected InvalidExtent, got {:?}", other),
    }

    let extent = temporal::parse_extent((Some("2021-01-01"), Some("2021-02-01"))).unwrap();
    let t = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
    assert!(temporal::in_extent(t(2021, 1, 1), &extent)); // inclusive start
    assert!(temporal::in_extent(t(2021, 1, 31), &extent));
    assert!(!temporal::in_extent(t(2021, 2, 1), &extent)); // exclusive end

    let open_start = temporal::parse_extent((None, Some("2021-02-01"))).unwrap();
    assert!(temporal::in_extent(t(1999, 1, 1), &open_start));
    assert!(!temporal::in_extent(t(2021, 2, 1), &open_start));
}

#[test]
fn test_parameter_validation() {
    let required = ParamSpec::required("bands");
    assert!(check_parameter(None, &required).is_err());
    assert!(check_parameter(Some(&json!("B02")), &required).is_ok());

    let optional = ParamSpec::optional("labels");
    assert!(check_parameter(None, &optional).is_ok());

    // Null handling
    assert!(check_parameter(Some(&json!(null)), &required).is_err());
    assert!(check_parameter(Some(&json!(null)), &ParamSpec::required("x").nullable()).is_ok());

    // Type constraints
    let numeric = ParamSpec::required("value").types(&[ParamType::Number]);
    assert!(check_parameter(Some(&json!(1.5)), &numeric).is_ok());
    assert!(check_parameter(Some(&json!("1.5")), &numeric).is_err());

    // Sequence constraints apply per element
    let string_list = ParamSpec::required("names")
        .array()
        .types(&[ParamType::String]);
    assert!(check_parameter(Some(&json!(["a", "b"])), &string_list).is_ok());
    assert!(check_parameter(Some(&json!(["a", 2])), &string_list).is_err());
    assert!(check_parameter(Some(&json!("a")), &string_list).is_err());

    // Integer and range constraints
    let count = ParamSpec::required("count").integer().min(0.0).max(10.0);
    assert!(check_parameter(Some(&json!(3)), &count).is_ok());
    assert!(check_parameter(Some(&json!(3.5)), &count).is_err());
    assert!(check_parameter(Some(&json!(-1)), &count).is_err());
    assert!(check_parameter(Some(&json!(11)), &count).is_err());

    match check_parameter(None, &required) {
        Err(CubeError::ValidationError { parameter, .. }) => assert_eq!(parameter, "bands"),
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_reducers_skip_no_data() {
    assert_eq!(Reducer::Mean.apply(&[1.0, f64::NAN, 3.0]), 2.0);
    assert_eq!(Reducer::Sum.apply(&[1.0, f64::INFINITY, 3.0]), 4.0);
    assert_eq!(Reducer::Min.apply(&[f64::NAN, 5.0, 2.0]), 2.0);
    assert_eq!(Reducer::Max.apply(&[f64::NAN, 5.0, 2.0]), 5.0);

    // Nothing valid left
    assert!(Reducer::Mean.apply(&[]).is_nan());
    assert!(Reducer::Min.apply(&[f64::NAN]).is_nan());
    assert!(Reducer::Max.apply(&[]).is_nan());
    assert_eq!(Reducer::Sum.apply(&[]), 0.0);
}

#[test]
fn test_reducer_parsing() {
    assert_eq!("mean".parse::<Reducer>().unwrap(), Reducer::Mean);
    assert_eq!("minimum".parse::<Reducer>().unwrap(), Reducer::Min);
    assert_eq!(Reducer::Max.as_str(), "maximum");
    assert!("median".parse::<Reducer>().is_err());
}
