use serde::Serialize;

use crate::model::{Scheme, ScoreLookup, Subject, WEIGHT_EPSILON};

/// Pass mark on the 0-10 scale. Compared against the unrounded final.
pub const PASS_THRESHOLD: f64 = 5.0;

/// Standard half-up rounding to 2 decimals, applied to every grade that
/// leaves the engine. Pass/fail comparisons happen before this.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (100.0 * x).round() / 100.0
}

/// Configuration health of a subject's grading scheme. Grade entry is only
/// meaningful once `Complete`; callers gate on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeStatus {
    Unconfigured,
    Partial,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWeightCheck {
    pub evaluation_id: String,
    pub test_count: usize,
    pub test_weight_total: f64,
    pub ok: bool,
}

/// Per-condition breakdown behind a classification, for the configuration
/// health indicator in the gradebook UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyDetail {
    pub status: SchemeStatus,
    pub evaluation_count_ok: bool,
    pub evaluation_count_declared: usize,
    pub evaluation_count_actual: usize,
    pub evaluation_weight_total: f64,
    pub evaluation_weights_ok: bool,
    pub tests: Vec<TestWeightCheck>,
}

fn sums_to_100(total: f64) -> bool {
    (total - 100.0).abs() <= WEIGHT_EPSILON
}

pub fn classify(subject: &Subject, scheme: Option<&Scheme>) -> SchemeStatus {
    classify_detail(subject, scheme).status
}

/// Structural/arithmetic validation only; no grade math happens here. Each
/// weight sum is checked independently against the fixed epsilon.
pub fn classify_detail(subject: &Subject, scheme: Option<&Scheme>) -> ClassifyDetail {
    let Some(scheme) = scheme else {
        return ClassifyDetail {
            status: SchemeStatus::Unconfigured,
            evaluation_count_ok: false,
            evaluation_count_declared: subject.evaluation_count,
            evaluation_count_actual: 0,
            evaluation_weight_total: 0.0,
            evaluation_weights_ok: false,
            tests: Vec::new(),
        };
    };

    let evaluation_count_ok = scheme.evaluations.len() == subject.evaluation_count;
    let evaluation_weight_total: f64 = scheme.evaluations.iter().map(|e| e.weight).sum();
    let evaluation_weights_ok = sums_to_100(evaluation_weight_total);

    let tests: Vec<TestWeightCheck> = scheme
        .evaluations
        .iter()
        .map(|e| {
            let total: f64 = e.tests.iter().map(|t| t.weight).sum();
            TestWeightCheck {
                evaluation_id: e.id.clone(),
                test_count: e.tests.len(),
                test_weight_total: total,
                ok: !e.tests.is_empty() && sums_to_100(total),
            }
        })
        .collect();

    let complete = evaluation_count_ok && evaluation_weights_ok && tests.iter().all(|c| c.ok);
    ClassifyDetail {
        status: if complete {
            SchemeStatus::Complete
        } else {
            SchemeStatus::Partial
        },
        evaluation_count_ok,
        evaluation_count_declared: subject.evaluation_count,
        evaluation_count_actual: scheme.evaluations.len(),
        evaluation_weight_total,
        evaluation_weights_ok,
        tests,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationGrade {
    pub evaluation_id: String,
    /// 0-10, rounded to 2 decimals; `None` while no test in the evaluation
    /// has a usable score.
    pub grade: Option<f64>,
    /// Sum of the weights of the tests that actually had a score.
    pub covered_weight: f64,
    pub tests_graded: usize,
    pub tests_total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGrade {
    pub student_id: String,
    /// 0-10, rounded to 2 decimals; `None` when no evaluation is determined.
    pub final_grade: Option<f64>,
    /// `Some` only once every evaluation is determined. While any evaluation
    /// is still undetermined the final is a lower bound, not a verdict, and
    /// the student counts as pending.
    pub passed: Option<bool>,
    pub per_evaluation: Vec<EvaluationGrade>,
}

/// Weighted rollup for one student over one scheme.
///
/// Within an evaluation, tests without a score contribute nothing and the
/// weighted sum is renormalized by the weight actually covered. Across
/// evaluations there is deliberately no renormalization: an undetermined
/// evaluation contributes 0 to the final without redistributing its weight,
/// so an in-progress final only ever understates the eventual grade.
pub fn compute_subject_grade<S: ScoreLookup>(
    scheme: &Scheme,
    student_id: &str,
    scores: &S,
) -> SubjectGrade {
    let mut per_evaluation: Vec<EvaluationGrade> = Vec::with_capacity(scheme.evaluations.len());
    let mut raw_grades: Vec<Option<f64>> = Vec::with_capacity(scheme.evaluations.len());

    for ev in &scheme.evaluations {
        let mut weighted_sum = 0.0_f64;
        let mut covered_weight = 0.0_f64;
        let mut tests_graded = 0_usize;

        for t in &ev.tests {
            let Some(s) = scores.score(student_id, &t.id) else {
                // Not yet graded: excluded entirely, never counted as zero.
                continue;
            };
            if s.max_value <= 0.0 {
                // Malformed score; contributes nothing rather than dividing
                // by zero.
                continue;
            }
            let normalized = s.value / s.max_value * 10.0;
            weighted_sum += normalized * (t.weight / 100.0);
            covered_weight += t.weight;
            tests_graded += 1;
        }

        let raw = if covered_weight <= 0.0 {
            None
        } else if covered_weight < 100.0 {
            Some(weighted_sum / covered_weight * 100.0)
        } else {
            Some(weighted_sum)
        };

        raw_grades.push(raw);
        per_evaluation.push(EvaluationGrade {
            evaluation_id: ev.id.clone(),
            grade: raw.map(round_off_2_decimals),
            covered_weight,
            tests_graded,
            tests_total: ev.tests.len(),
        });
    }

    let mut final_raw = 0.0_f64;
    let mut any_determined = false;
    let mut all_determined = true;
    for (ev, raw) in scheme.evaluations.iter().zip(&raw_grades) {
        match raw {
            Some(g) => {
                any_determined = true;
                final_raw += g * (ev.weight / 100.0);
            }
            None => all_determined = false,
        }
    }

    let final_grade = any_determined.then(|| round_off_2_decimals(final_raw));
    let passed = (any_determined && all_determined).then(|| final_raw >= PASS_THRESHOLD);

    SubjectGrade {
        student_id: student_id.to_string(),
        final_grade,
        passed,
        per_evaluation,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary {
    pub per_student: Vec<SubjectGrade>,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    /// Mean of the finals of pass/fail-classified students; 0 when none.
    pub average: f64,
}

/// Runs the subject rollup once per student and buckets the outcomes.
/// Pending students are excluded from the average entirely.
pub fn compute_cohort<S: ScoreLookup>(
    scheme: &Scheme,
    student_ids: &[String],
    scores: &S,
) -> CohortSummary {
    let mut per_student: Vec<SubjectGrade> = Vec::with_capacity(student_ids.len());
    let mut passed = 0_usize;
    let mut failed = 0_usize;
    let mut pending = 0_usize;
    let mut sum = 0.0_f64;
    let mut counted = 0_usize;

    for id in student_ids {
        let grade = compute_subject_grade(scheme, id, scores);
        match grade.passed {
            Some(true) => passed += 1,
            Some(false) => failed += 1,
            None => pending += 1,
        }
        if grade.passed.is_some() {
            if let Some(f) = grade.final_grade {
                sum += f;
                counted += 1;
            }
        }
        per_student.push(grade);
    }

    let average = if counted > 0 {
        round_off_2_decimals(sum / counted as f64)
    } else {
        0.0
    };

    CohortSummary {
        per_student,
        passed,
        failed,
        pending,
        average,
    }
}
