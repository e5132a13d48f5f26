use rentsplit_core::{allocate, AllocationError, Money, ShareBasis, ShareInput};
use uuid::Uuid;

fn shares(percentages: &[f64]) -> Vec<ShareInput> {
    percentages
        .iter()
        .enumerate()
        .map(|(index, &share_percent)| ShareInput {
            beneficiary_id: Uuid::from_u128(index as u128 + 1),
            share_percent,
        })
        .collect()
}

fn allocated_sum(lines: &[rentsplit_core::AllocationLine]) -> Money {
    lines.iter().map(|line| line.amount).sum()
}

#[test]
fn non_terminating_thirds_sum_exactly() {
    let outcome = allocate(
        Money::from_minor_units(100_000),
        &shares(&[33.33, 33.33, 33.34]),
        ShareBasis::FullCoverage,
    )
    .unwrap();

    let amounts: Vec<i64> = outcome
        .lines
        .iter()
        .map(|line| line.amount.minor_units())
        .collect();
    assert_eq!(amounts, vec![33_330, 33_330, 33_340]);
    assert_eq!(allocated_sum(&outcome.lines), Money::from_minor_units(100_000));
    assert_eq!(outcome.withheld, Money::ZERO);
}

#[test]
fn even_split_has_no_remainder() {
    let outcome = allocate(
        Money::from_minor_units(120_000),
        &shares(&[50.0, 50.0]),
        ShareBasis::FullCoverage,
    )
    .unwrap();

    let amounts: Vec<i64> = outcome
        .lines
        .iter()
        .map(|line| line.amount.minor_units())
        .collect();
    assert_eq!(amounts, vec![60_000, 60_000]);
}

#[test]
fn sevenths_split_sums_exactly() {
    // 1/7 is non-terminating in both binary and decimal.
    let outcome = allocate(
        Money::from_minor_units(10_000),
        &shares(&[14.29, 14.29, 14.29, 14.29, 14.29, 14.29, 14.26]),
        ShareBasis::FullCoverage,
    )
    .unwrap();

    assert_eq!(allocated_sum(&outcome.lines), Money::from_minor_units(10_000));
}

#[test]
fn uneven_splits_always_sum_to_the_total() {
    let cases: &[(i64, &[f64])] = &[
        (100_001, &[33.33, 33.33, 33.34]),
        (99_999, &[10.0, 20.0, 30.0, 40.0]),
        (1, &[50.0, 50.0]),
        (3, &[33.33, 33.33, 33.34]),
        (77_777, &[12.5, 12.5, 25.0, 50.0]),
        (101, &[1.0, 99.0]),
    ];

    for &(total_minor, percentages) in cases {
        let outcome = allocate(
            Money::from_minor_units(total_minor),
            &shares(percentages),
            ShareBasis::FullCoverage,
        )
        .unwrap();
        assert_eq!(
            allocated_sum(&outcome.lines),
            Money::from_minor_units(total_minor),
            "sum drifted for total={total_minor} percentages={percentages:?}"
        );
    }
}

#[test]
fn remainder_units_go_to_largest_fractions_with_stable_ties() {
    // 100.01 split three ways: two extra cents, remainders tie at 1/3.
    let outcome = allocate(
        Money::from_minor_units(10_001),
        &shares(&[33.33, 33.33, 33.34]),
        ShareBasis::FullCoverage,
    )
    .unwrap();

    assert_eq!(allocated_sum(&outcome.lines), Money::from_minor_units(10_001));

    // Rerunning yields the identical split: ties are broken by
    // beneficiary id, not input order or hash state.
    let again = allocate(
        Money::from_minor_units(10_001),
        &shares(&[33.33, 33.33, 33.34]),
        ShareBasis::FullCoverage,
    )
    .unwrap();
    assert_eq!(outcome.lines, again.lines);
}

#[test]
fn partial_basis_reports_the_withheld_remainder() {
    let outcome = allocate(
        Money::from_minor_units(100_000),
        &shares(&[60.0, 15.0]),
        ShareBasis::EligibleSubset,
    )
    .unwrap();

    let allocated = allocated_sum(&outcome.lines);
    assert_eq!(allocated, Money::from_minor_units(75_000));
    assert_eq!(outcome.withheld, Money::from_minor_units(25_000));
    assert_eq!(allocated + outcome.withheld, Money::from_minor_units(100_000));
}

#[test]
fn mismatch_error_names_the_actual_sum() {
    let err = allocate(
        Money::from_minor_units(100_000),
        &shares(&[30.0, 20.0]),
        ShareBasis::FullCoverage,
    )
    .unwrap_err();

    match err {
        AllocationError::PercentageMismatch { share_total } => assert_eq!(share_total, 50.0),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_input_is_an_error_under_both_bases() {
    for basis in [ShareBasis::FullCoverage, ShareBasis::EligibleSubset] {
        let err = allocate(Money::from_minor_units(100_000), &[], basis).unwrap_err();
        assert_eq!(err, AllocationError::EmptyInput);
    }
}
