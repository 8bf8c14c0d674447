use interp_core::errors::InterpError;
use interp_core::provenance::SchemaVersion;
use interp_rules::{
    builtin_descriptors, resolve, GuardId, MethodDescriptor, MetricRole, MetricRule, RuleTable,
    SectionKind,
};

#[test]
fn builtin_table_loads_every_family() -> Result<(), InterpError> {
    let table = RuleTable::builtin()?;
    assert_eq!(table.len(), builtin_descriptors().len());
    for id in [
        "one-sample-t-test",
        "independent-t-test",
        "paired-t-test",
        "one-way-anova",
        "n-way-anova",
        "mann-whitney-u",
        "kruskal-wallis",
        "chi-square-independence",
        "pearson-correlation",
        "linear-regression",
        "logistic-regression",
        "discriminant-analysis",
    ] {
        assert_eq!(table.resolve(id)?.id, id);
    }
    Ok(())
}

#[test]
fn unknown_methods_are_reported_not_defaulted() {
    let err = resolve("not-a-real-method").unwrap_err();
    assert!(matches!(err, InterpError::UnknownMethod(_)));
    assert_eq!(
        err.info().context.get("method_id").map(String::as_str),
        Some("not-a-real-method")
    );
}

#[test]
fn builtin_table_has_no_consistency_issues() -> Result<(), InterpError> {
    let issues = RuleTable::builtin()?.consistency_issues();
    assert!(issues.is_empty(), "{issues:?}");
    Ok(())
}

#[test]
fn guard_orders_follow_the_standard_sequence() -> Result<(), InterpError> {
    for descriptor in RuleTable::builtin()?.iter() {
        let positions: Vec<usize> = descriptor
            .guards
            .iter()
            .map(|guard| {
                GuardId::STANDARD_ORDER
                    .iter()
                    .position(|candidate| candidate == guard)
                    .unwrap()
            })
            .collect();
        assert!(
            positions.windows(2).all(|pair| pair[0] < pair[1]),
            "{} schedules guards out of order",
            descriptor.id
        );
    }
    Ok(())
}

#[test]
fn accuracy_guards_are_scheduled_only_where_accuracy_exists() -> Result<(), InterpError> {
    for descriptor in RuleTable::builtin()?.iter() {
        let has_accuracy = descriptor
            .metrics
            .iter()
            .any(|rule| rule.is_accuracy_like());
        let schedules_accuracy = descriptor.guards.contains(&GuardId::UndefinedCriticalMetric);
        assert_eq!(has_accuracy, schedules_accuracy, "{}", descriptor.id);
    }
    Ok(())
}

#[test]
fn fingerprint_is_stable() -> Result<(), InterpError> {
    let table = RuleTable::builtin()?;
    let rebuilt = RuleTable::new(table.version(), builtin_descriptors())?;
    assert_eq!(table.fingerprint()?, rebuilt.fingerprint()?);
    Ok(())
}

#[test]
fn duplicate_methods_are_rejected() {
    let descriptor = MethodDescriptor::new(
        "dup",
        "Duplicate",
        vec![MetricRule::new(
            "p_value",
            "p-value",
            MetricRole::PValue,
            SectionKind::Statistical,
        )],
    );
    let err = RuleTable::new(SchemaVersion::default(), vec![descriptor.clone(), descriptor])
        .unwrap_err();
    assert_eq!(err.info().code, "duplicate_method");
}

#[test]
fn invalid_descriptors_are_rejected() {
    let base = MethodDescriptor::new(
        "broken",
        "Broken",
        vec![MetricRule::new(
            "p_value",
            "p-value",
            MetricRole::PValue,
            SectionKind::Statistical,
        )],
    );

    let mut bad_alpha = base.clone();
    bad_alpha.thresholds.alpha = 1.5;
    assert_eq!(bad_alpha.validate().unwrap_err().info().code, "invalid_alpha");

    let mut no_caveats = base.clone();
    no_caveats.sections = vec![SectionKind::Statistical, SectionKind::Practical];
    assert_eq!(
        no_caveats.validate().unwrap_err().info().code,
        "missing_caveats_section"
    );

    let mut misrouted = base.clone();
    misrouted.sections = vec![SectionKind::Statistical, SectionKind::Caveats];
    misrouted.metrics.push(MetricRule::new(
        "mean",
        "Mean",
        MetricRole::Estimate,
        SectionKind::Practical,
    ));
    assert_eq!(
        misrouted.validate().unwrap_err().info().code,
        "undeclared_section"
    );

    let mut duplicate_guard = base;
    duplicate_guard.guards = vec![GuardId::RangeCheck, GuardId::RangeCheck];
    assert_eq!(
        duplicate_guard.validate().unwrap_err().info().code,
        "duplicate_guard"
    );
}

#[test]
fn consistency_check_flags_misrouted_accuracy() -> Result<(), InterpError> {
    let descriptor = MethodDescriptor::new(
        "misrouted",
        "Misrouted",
        vec![
            MetricRule::new("p_value", "p-value", MetricRole::PValue, SectionKind::Statistical),
            MetricRule::new("accuracy", "Accuracy", MetricRole::Accuracy, SectionKind::Statistical),
        ],
    );
    let table = RuleTable::new(SchemaVersion::default(), vec![descriptor])?;
    let issues = table.consistency_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].metric.as_deref(), Some("accuracy"));
    Ok(())
}

#[test]
fn accuracy_like_flag_extends_the_role_class() -> Result<(), InterpError> {
    let table = RuleTable::builtin()?;
    let r_squared = table.resolve("linear-regression")?.metric("r_squared").unwrap();
    assert!(r_squared.is_accuracy_like());
    assert!(!r_squared.role.is_accuracy_like());

    let nested = MethodDescriptor::new(
        "nested-flag",
        "Nested flag",
        vec![
            MetricRule::new("p_value", "p-value", MetricRole::PValue, SectionKind::Statistical),
            MetricRule::new("levene", "Levene", MetricRole::AssumptionCheck, SectionKind::Caveats)
                .accuracy_like(),
        ],
    );
    let err = RuleTable::new(SchemaVersion::default(), vec![nested]).unwrap_err();
    assert_eq!(err.info().code, "nested_accuracy_like");
    Ok(())
}
