//! Built-in descriptors for the supported method families.
//!
//! Adding a method is a data change here; guards and the composer stay generic.

use interp_format::EffectSizeKind;

use crate::descriptor::{GuardId, MethodDescriptor, MetricRole, MetricRule};
use crate::descriptor::MetricRole::*;
use crate::descriptor::SectionKind::{Caveats, Practical, Statistical};

fn effect(kind: EffectSizeKind) -> MetricRole {
    EffectSize { kind }
}

fn p_value() -> MetricRule {
    MetricRule::new("p_value", "p-value", PValue, Statistical).required()
}

fn sample_size() -> MetricRule {
    MetricRule::new("n", "Sample size", Count, Statistical)
}

fn assumption(key: &str, label: &str) -> MetricRule {
    MetricRule::new(key, label, AssumptionCheck, Caveats)
}

/// Standard guard order minus the accuracy guards, for methods without an
/// accuracy-like metric.
fn inferential_guards() -> Vec<GuardId> {
    GuardId::STANDARD_ORDER
        .into_iter()
        .filter(|guard| {
            !matches!(
                guard,
                GuardId::UndefinedCriticalMetric | GuardId::ZeroValue
            )
        })
        .collect()
}

fn rank_guards() -> Vec<GuardId> {
    inferential_guards()
        .into_iter()
        .filter(|guard| *guard != GuardId::AssumptionRelocation)
        .collect()
}

fn one_sample_t_test() -> MethodDescriptor {
    MethodDescriptor::new(
        "one-sample-t-test",
        "One-sample t-test",
        vec![
            MetricRule::new("t_statistic", "t statistic", Statistic, Statistical).required(),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("mean", "Sample mean", Estimate, Practical),
            MetricRule::new(
                "mean_difference",
                "Difference from the test value",
                Estimate,
                Practical,
            ),
            MetricRule::new("cohens_d", "Cohen's d", effect(EffectSizeKind::CohensD), Practical),
            assumption("normality", "Normality (Shapiro-Wilk)"),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", Some(10.0))
}

fn independent_t_test() -> MethodDescriptor {
    MethodDescriptor::new(
        "independent-t-test",
        "Independent-samples t-test",
        vec![
            MetricRule::new("t_statistic", "t statistic", Statistic, Statistical).required(),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("mean_difference", "Mean difference", Estimate, Practical),
            MetricRule::new("cohens_d", "Cohen's d", effect(EffectSizeKind::CohensD), Practical),
            MetricRule::new("group_stats", "Group summaries", GroupStatistics, Practical),
            assumption("levene", "Equality of variances (Levene's test)"),
            assumption("normality", "Normality (Shapiro-Wilk)"),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", Some(10.0))
}

fn paired_t_test() -> MethodDescriptor {
    MethodDescriptor::new(
        "paired-t-test",
        "Paired-samples t-test",
        vec![
            MetricRule::new("t_statistic", "t statistic", Statistic, Statistical).required(),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("mean_difference", "Mean of the differences", Estimate, Practical),
            MetricRule::new("cohens_d", "Cohen's d", effect(EffectSizeKind::CohensD), Practical),
            assumption("normality", "Normality of the differences (Shapiro-Wilk)"),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", Some(10.0))
}

fn one_way_anova() -> MethodDescriptor {
    MethodDescriptor::new(
        "one-way-anova",
        "One-way ANOVA",
        vec![
            MetricRule::new("f_statistic", "F statistic", Statistic, Statistical).required(),
            MetricRule::new(
                "df_between",
                "Between-groups degrees of freedom",
                DegreesOfFreedom,
                Statistical,
            ),
            MetricRule::new(
                "df_within",
                "Within-groups degrees of freedom",
                DegreesOfFreedom,
                Statistical,
            ),
            p_value(),
            sample_size(),
            MetricRule::new("post_hoc", "Post-hoc comparisons", Comparisons, Statistical),
            MetricRule::new(
                "eta_squared",
                "Eta squared",
                effect(EffectSizeKind::EtaSquared),
                Practical,
            ),
            MetricRule::new("group_stats", "Group summaries", GroupStatistics, Practical),
            assumption("levene", "Homogeneity of variances (Levene's test)"),
            assumption("normality", "Normality of residuals (Shapiro-Wilk)"),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", None)
}

fn n_way_anova() -> MethodDescriptor {
    MethodDescriptor::new(
        "n-way-anova",
        "N-way ANOVA",
        vec![
            MetricRule::new(
                "f_statistic",
                "F statistic (model)", Statistic, Statistical).required(),
            MetricRule::new("df_model", "Model degrees of freedom", DegreesOfFreedom, Statistical),
            MetricRule::new("df_error", "Error degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            MetricRule::new("interaction_p", "Interaction p-value", PValue, Statistical),
            sample_size(),
            MetricRule::new("post_hoc", "Post-hoc comparisons", Comparisons, Statistical),
            MetricRule::new(
                "partial_eta_squared",
                "Partial eta squared",
                effect(EffectSizeKind::PartialEtaSquared),
                Practical,
            ),
            assumption("levene", "Homogeneity of variances (Levene's test)"),
            MetricRule::new("factor_table", "Factor table", Estimate, Statistical).excluded(),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", None)
}

fn mann_whitney_u() -> MethodDescriptor {
    MethodDescriptor::new(
        "mann-whitney-u",
        "Mann-Whitney U test",
        vec![
            MetricRule::new("u_statistic", "U statistic", Statistic, Statistical).required(),
            MetricRule::new("z_score", "z score", Statistic, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new(
                "effect_r",
                "Rank-biserial correlation",
                effect(EffectSizeKind::CorrelationR),
                Practical,
            ),
            MetricRule::new("group_stats", "Group summaries", GroupStatistics, Practical),
        ],
    )
    .with_guards(rank_guards())
    .with_sample_size("n", Some(10.0))
}

fn kruskal_wallis() -> MethodDescriptor {
    MethodDescriptor::new(
        "kruskal-wallis",
        "Kruskal-Wallis H test",
        vec![
            MetricRule::new("h_statistic", "H statistic", Statistic, Statistical).required(),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("post_hoc", "Post-hoc comparisons (Dunn)", Comparisons, Statistical),
            MetricRule::new(
                "epsilon_squared",
                "Epsilon squared",
                effect(EffectSizeKind::EtaSquared),
                Practical,
            ),
        ],
    )
    .with_guards(rank_guards())
    .with_sample_size("n", None)
}

fn chi_square_independence() -> MethodDescriptor {
    MethodDescriptor::new(
        "chi-square-independence",
        "Chi-square test of independence",
        vec![
            MetricRule::new(
                "chi_square", "Chi-square statistic", Statistic, Statistical).required(),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("cramers_v", "Cramér's V", effect(EffectSizeKind::CramersV), Practical),
            assumption("expected_counts", "Expected cell counts of at least 5"),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", Some(20.0))
}

fn pearson_correlation() -> MethodDescriptor {
    MethodDescriptor::new(
        "pearson-correlation",
        "Pearson correlation",
        vec![
            MetricRule::new(
                "r",
                "Correlation coefficient r",
                effect(EffectSizeKind::CorrelationR),
                Statistical,
            )
            .required(),
            p_value(),
            sample_size(),
            MetricRule::new("r_squared", "Shared variance (r²)", Percentage, Practical),
            assumption("normality", "Bivariate normality"),
        ],
    )
    .with_guards(inferential_guards())
    .with_sample_size("n", Some(10.0))
}

fn linear_regression() -> MethodDescriptor {
    MethodDescriptor::new(
        "linear-regression",
        "Linear regression",
        vec![
            MetricRule::new("f_statistic", "F statistic", Statistic, Statistical).required(),
            MetricRule::new("df_model", "Model degrees of freedom", DegreesOfFreedom, Statistical),
            MetricRule::new(
                "df_residual",
                "Residual degrees of freedom",
                DegreesOfFreedom,
                Statistical,
            ),
            p_value(),
            sample_size(),
            MetricRule::new("r_squared", "R squared", effect(EffectSizeKind::RSquared), Practical)
                .accuracy_like(),
            MetricRule::new(
                "adjusted_r_squared",
                "Adjusted R squared",
                effect(EffectSizeKind::RSquared),
                Practical,
            ),
            assumption("residual_normality", "Normality of residuals"),
            assumption("homoscedasticity", "Constant error variance (Breusch-Pagan)"),
            MetricRule::new("coefficients", "Coefficient table", Estimate, Statistical).excluded(),
        ],
    )
    .with_sample_size("n", Some(20.0))
}

fn logistic_regression() -> MethodDescriptor {
    MethodDescriptor::new(
        "logistic-regression",
        "Logistic regression",
        vec![
            MetricRule::new("chi_square", "Model chi-square", Statistic, Statistical).required(),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("accuracy", "Classification accuracy", Accuracy, Practical),
            MetricRule::new(
                "nagelkerke_r2",
                "Nagelkerke R squared",
                effect(EffectSizeKind::RSquared),
                Practical,
            ),
            assumption("hosmer_lemeshow", "Model fit (Hosmer-Lemeshow)"),
            MetricRule::new("coefficients", "Coefficient table", Estimate, Statistical).excluded(),
        ],
    )
    .with_sample_size("n", Some(50.0))
}

fn discriminant_analysis() -> MethodDescriptor {
    MethodDescriptor::new(
        "discriminant-analysis",
        "Linear discriminant analysis",
        vec![
            MetricRule::new("wilks_lambda", "Wilks' lambda", Statistic, Statistical).required(),
            MetricRule::new("chi_square", "Chi-square statistic", Statistic, Statistical),
            MetricRule::new("df", "Degrees of freedom", DegreesOfFreedom, Statistical),
            p_value(),
            sample_size(),
            MetricRule::new("accuracy", "Classification accuracy", Accuracy, Practical),
            MetricRule::new(
                "cross_validated_accuracy",
                "Cross-validated accuracy",
                Accuracy,
                Practical,
            ),
            assumption("box_m", "Equality of covariance matrices (Box's M)"),
            MetricRule::new("eigenvalues", "Eigenvalues", Estimate, Statistical).excluded(),
        ],
    )
    .with_sample_size("n", Some(20.0))
}

/// All built-in descriptors in authoring order.
pub fn builtin_descriptors() -> Vec<MethodDescriptor> {
    vec![
        one_sample_t_test(),
        independent_t_test(),
        paired_t_test(),
        one_way_anova(),
        n_way_anova(),
        mann_whitney_u(),
        kruskal_wallis(),
        chi_square_independence(),
        pearson_correlation(),
        linear_regression(),
        logistic_regression(),
        discriminant_analysis(),
    ]
}
