//! Cohort analysis orchestrator.
//!
//! Fans a cohort's answers out into one collusion scan per question and one
//! exam analysis per student, runs them on the blocking pool, and assembles a
//! [`CohortRun`].

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::aggregate::{ExamAggregator, ExamSuspicionSummary};
use crate::collusion::{pair_count, sort_pairs, CollusionDetector, CollusionScan};
use crate::config::AnalysisConfig;
use crate::model::{Answer, ExamAnswer};
use crate::parser::load_rules;
use crate::report::{build_report, CohortRun};
use crate::similarity::SimilarityEngine;
use crate::traps::TrapScorer;

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_run_start(&self, questions: usize, students: usize);
    fn on_scan_complete(&self, scan: &CollusionScan);
    fn on_exam_complete(&self, summary: &ExamSuspicionSummary);
    fn on_task_error(&self, task: &str, error: &str);
    fn on_run_complete(&self, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_run_start(&self, _: usize, _: usize) {}
    fn on_scan_complete(&self, _: &CollusionScan) {}
    fn on_exam_complete(&self, _: &ExamSuspicionSummary) {}
    fn on_task_error(&self, _: &str, _: &str) {}
    fn on_run_complete(&self, _: usize, _: usize, _: Duration) {}
}

enum Job {
    Scan {
        question_index: u32,
        answers: Vec<(String, String)>,
        max_pairs: Option<usize>,
    },
    Exam {
        student_id: String,
        answers: Vec<ExamAnswer>,
    },
}

enum JobOutput {
    Scan(CollusionScan),
    Exam(ExamSuspicionSummary),
}

#[derive(Clone)]
enum JobKey {
    Question(u32),
    Student(String),
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKey::Question(q) => write!(f, "collusion scan for question {q}"),
            JobKey::Student(id) => write!(f, "exam analysis for student {id}"),
        }
    }
}

impl Job {
    fn key(&self) -> JobKey {
        match self {
            Job::Scan { question_index, .. } => JobKey::Question(*question_index),
            Job::Exam { student_id, .. } => JobKey::Student(student_id.clone()),
        }
    }
}

/// Shared, read-only state handed to every job.
struct JobContext {
    scorer: Arc<TrapScorer>,
    similarity: Arc<SimilarityEngine>,
    similarity_threshold: f64,
    ai_threshold: u32,
}

impl JobContext {
    fn execute(&self, job: Job) -> JobOutput {
        match job {
            Job::Scan {
                question_index,
                answers,
                max_pairs,
            } => JobOutput::Scan(
                CollusionDetector::new(&self.similarity, self.similarity_threshold)
                    .with_max_pairs(max_pairs)
                    .scan(question_index, &answers),
            ),
            Job::Exam {
                student_id,
                answers,
            } => JobOutput::Exam(
                ExamAggregator::new(&self.scorer, self.ai_threshold).analyze(&student_id, &answers),
            ),
        }
    }

    /// Stand-in output for a job that did not finish.
    fn empty_output(&self, key: &JobKey) -> JobOutput {
        match key {
            JobKey::Question(q) => JobOutput::Scan(CollusionScan::empty(*q)),
            JobKey::Student(id) => {
                JobOutput::Exam(ExamAggregator::new(&self.scorer, self.ai_threshold).analyze(id, &[]))
            }
        }
    }
}

/// Run `work` over every job on the blocking pool, at most `parallelism` at a
/// time. Each future yields the job's key with its output, or the error that
/// stopped it, in completion order.
fn spawn_bounded<K, J, O, F>(
    jobs: Vec<(K, J)>,
    parallelism: usize,
    work: F,
) -> FuturesUnordered<impl Future<Output = (K, Result<O>)>>
where
    J: Send + 'static,
    O: Send + 'static,
    F: Fn(J) -> O + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let work = Arc::new(work);
    let futures = FuturesUnordered::new();

    for (key, job) in jobs {
        let semaphore = Arc::clone(&semaphore);
        let work = Arc::clone(&work);

        futures.push(async move {
            let outcome = async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                tokio::task::spawn_blocking(move || (*work)(job))
                    .await
                    .map_err(|e| anyhow::anyhow!("task did not complete: {e}"))
            }
            .await;
            (key, outcome)
        });
    }

    futures
}

/// Split a global comparison budget across questions in ascending index order.
///
/// `students` maps each question to its distinct student count. Returns each
/// question's pair allowance, or `None` everywhere when unbudgeted.
pub fn apportion_budget(
    students: &BTreeMap<u32, usize>,
    budget: Option<usize>,
) -> BTreeMap<u32, Option<usize>> {
    let mut remaining = budget;
    students
        .iter()
        .map(|(&question, &n)| {
            let allowance = remaining.map(|left| {
                let take = pair_count(n).min(left);
                remaining = Some(left - take);
                take
            });
            (question, allowance)
        })
        .collect()
}

/// Analyzes a whole cohort of exam answers.
pub struct CohortAnalyzer {
    context: Arc<JobContext>,
    config: AnalysisConfig,
}

impl CohortAnalyzer {
    pub fn new(scorer: Arc<TrapScorer>, similarity: SimilarityEngine, config: AnalysisConfig) -> Self {
        let context = Arc::new(JobContext {
            scorer,
            similarity: Arc::new(similarity),
            similarity_threshold: config.similarity_threshold,
            ai_threshold: config.ai_threshold,
        });
        Self { context, config }
    }

    /// Build an analyzer from configuration, loading `rules_path` when set.
    pub fn from_config(config: AnalysisConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let scorer = match &config.rules_path {
            Some(path) => load_rules(path)?,
            None => TrapScorer::with_default_rules(),
        };
        let similarity = config.similarity_engine();
        Ok(Self::new(Arc::new(scorer), similarity, config))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a cohort's answers.
    pub async fn run(&self, answers: &[Answer], progress: &dyn ProgressReporter) -> Result<CohortRun> {
        self.config.validate().context("invalid configuration")?;

        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let min_chars = self.config.min_answer_chars;

        let kept: Vec<&Answer> = answers
            .iter()
            .filter(|a| a.answer_text.trim().chars().count() >= min_chars)
            .collect();
        let skipped = answers.len() - kept.len();
        if skipped > 0 {
            tracing::debug!("skipping {skipped} answer(s) shorter than {min_chars} characters");
        }

        let mut by_question: BTreeMap<u32, Vec<(String, String)>> = BTreeMap::new();
        let mut by_student: BTreeMap<String, Vec<ExamAnswer>> = BTreeMap::new();
        for answer in &kept {
            let student = answer.student_key().to_string();
            by_question
                .entry(answer.question_index)
                .or_default()
                .push((student.clone(), answer.answer_text.clone()));
            by_student
                .entry(student)
                .or_default()
                .push(ExamAnswer::new(answer.question_index, answer.answer_text.clone()));
        }
        for items in by_student.values_mut() {
            items.sort_by_key(|a| a.question_index);
        }

        let distinct: BTreeMap<u32, usize> = by_question
            .iter()
            .map(|(&q, items)| {
                let ids: BTreeSet<&str> = items.iter().map(|(id, _)| id.as_str()).collect();
                (q, ids.len())
            })
            .collect();
        let mut allowances = apportion_budget(&distinct, self.config.comparison_budget());

        progress.on_run_start(by_question.len(), by_student.len());

        let mut jobs = Vec::with_capacity(by_question.len() + by_student.len());
        for (question_index, answers) in by_question {
            if distinct.get(&question_index).copied().unwrap_or(0) < 2 {
                continue;
            }
            let max_pairs = allowances.remove(&question_index).flatten();
            jobs.push(Job::Scan {
                question_index,
                answers,
                max_pairs,
            });
        }
        for (student_id, answers) in by_student {
            jobs.push(Job::Exam {
                student_id,
                answers,
            });
        }

        let worker = Arc::clone(&self.context);
        let keyed: Vec<(JobKey, Job)> = jobs.into_iter().map(|job| (job.key(), job)).collect();
        let mut futures = spawn_bounded(keyed, self.config.parallelism, move |job: Job| {
            worker.execute(job)
        });

        let mut scans = Vec::new();
        let mut summaries = Vec::new();
        let mut completed = 0usize;
        let mut failed = 0usize;

        while let Some((key, outcome)) = futures.next().await {
            let output = match outcome {
                Ok(output) => {
                    completed += 1;
                    output
                }
                Err(e) => {
                    tracing::error!("{key} failed: {e:#}");
                    progress.on_task_error(&key.to_string(), &e.to_string());
                    failed += 1;
                    self.context.empty_output(&key)
                }
            };

            match output {
                JobOutput::Scan(scan) => {
                    progress.on_scan_complete(&scan);
                    scans.push(scan);
                }
                JobOutput::Exam(summary) => {
                    progress.on_exam_complete(&summary);
                    summaries.push(summary);
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_run_complete(completed, failed, elapsed);

        let total_comparisons = scans.iter().map(|s| s.comparisons).sum();
        let partial = scans.iter().any(|s| s.truncated);
        let mut pairs: Vec<_> = scans.into_iter().flat_map(|s| s.pairs).collect();
        sort_pairs(&mut pairs);

        tracing::info!(
            "analyzed {} answers: {} exams, {} comparisons, {} collusion pairs in {}ms",
            kept.len(),
            summaries.len(),
            total_comparisons,
            pairs.len(),
            elapsed.as_millis()
        );

        Ok(CohortRun {
            id: run_id,
            created_at: chrono::Utc::now(),
            duration_ms: elapsed.as_millis() as u64,
            config: self.config.clone(),
            total_answers: kept.len(),
            total_comparisons,
            partial,
            failed_tasks: failed,
            report: build_report(summaries, pairs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const SHARED: &str = "SELECT p.name FROM Pilots p JOIN Squadrons s ON p.squadron_id = s.squadron_id";
    const PLANTED: &str = "SELECT m.mission_id, m.duration_minutes FROM MissionAnalytics m JOIN MissionAnalytics x ON m.id = x.id";

    fn answer(student: &str, question_index: u32, text: &str) -> Answer {
        Answer {
            student_id: Some(student.into()),
            student_name: None,
            student_email: None,
            question_index,
            question_text: String::new(),
            answer_text: text.into(),
            exam_id: "exam-1".into(),
        }
    }

    fn cohort() -> Vec<Answer> {
        vec![
            answer("carol", 0, SHARED),
            answer("alice", 0, SHARED),
            answer("bob", 0, "UPDATE Aircraft SET status = 'grounded' WHERE aircraft_id = 7"),
            answer("alice", 1, PLANTED),
            answer("bob", 1, "SELECT name FROM Squadrons ORDER BY name"),
            answer("carol", 1, "short"),
        ]
    }

    fn analyzer(config: AnalysisConfig) -> CohortAnalyzer {
        CohortAnalyzer::from_config(config).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        scans: Mutex<Vec<u32>>,
        exams: Mutex<Vec<String>>,
        finished: Mutex<Option<(usize, usize)>>,
    }

    impl ProgressReporter for Recorder {
        fn on_run_start(&self, _: usize, _: usize) {}
        fn on_scan_complete(&self, scan: &CollusionScan) {
            self.scans.lock().unwrap().push(scan.question_index);
        }
        fn on_exam_complete(&self, summary: &ExamSuspicionSummary) {
            self.exams.lock().unwrap().push(summary.student_id.clone());
        }
        fn on_task_error(&self, _: &str, _: &str) {}
        fn on_run_complete(&self, completed: usize, failed: usize, _: Duration) {
            *self.finished.lock().unwrap() = Some((completed, failed));
        }
    }

    #[tokio::test]
    async fn analyzes_cohort() {
        let run = analyzer(AnalysisConfig::default())
            .run(&cohort(), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(run.total_answers, 5);
        assert!(!run.partial);
        assert_eq!(run.failed_tasks, 0);
        // q0: 3 students -> 3 pairs, q1: carol filtered -> 1 pair
        assert_eq!(run.total_comparisons, 4);

        let report = &run.report;
        assert_eq!(report.total_students, 3);
        assert_eq!(report.collusion_pair_count, 1);
        let pair = &report.collusion_pairs[0];
        assert_eq!((pair.student_a.as_str(), pair.student_b.as_str()), ("alice", "carol"));
        assert_eq!(pair.combined_score, 1.0);

        assert_eq!(report.exam_summaries[0].student_id, "alice");
        assert!(report.exam_summaries[0].exam_suspicious);
    }

    #[tokio::test]
    async fn result_is_independent_of_parallelism() {
        let serial = AnalysisConfig {
            parallelism: 1,
            ..AnalysisConfig::default()
        };
        let wide = AnalysisConfig {
            parallelism: 16,
            ..AnalysisConfig::default()
        };
        let a = analyzer(serial).run(&cohort(), &NoopReporter).await.unwrap();
        let b = analyzer(wide).run(&cohort(), &NoopReporter).await.unwrap();
        assert_eq!(a.report, b.report);
        assert_eq!(a.total_comparisons, b.total_comparisons);
    }

    #[tokio::test]
    async fn budget_marks_run_partial() {
        let config = AnalysisConfig {
            max_comparisons: Some(2),
            ..AnalysisConfig::default()
        };
        let run = analyzer(config).run(&cohort(), &NoopReporter).await.unwrap();
        assert!(run.partial);
        assert_eq!(run.total_comparisons, 2);
    }

    #[tokio::test]
    async fn progress_sees_every_task() {
        let recorder = Recorder::default();
        analyzer(AnalysisConfig::default())
            .run(&cohort(), &recorder)
            .await
            .unwrap();

        let mut scans = recorder.scans.lock().unwrap().clone();
        scans.sort();
        assert_eq!(scans, vec![0, 1]);
        assert_eq!(recorder.exams.lock().unwrap().len(), 3);
        assert_eq!(*recorder.finished.lock().unwrap(), Some((5, 0)));
    }

    #[tokio::test]
    async fn empty_cohort() {
        let run = analyzer(AnalysisConfig::default())
            .run(&[], &NoopReporter)
            .await
            .unwrap();
        assert_eq!(run.total_answers, 0);
        assert_eq!(run.report.total_students, 0);
        assert_eq!(run.report.average_similarity_score, 0.0);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let analyzer = CohortAnalyzer::new(
            Arc::new(TrapScorer::with_default_rules()),
            SimilarityEngine::default(),
            AnalysisConfig {
                parallelism: 0,
                ..AnalysisConfig::default()
            },
        );
        assert!(analyzer.run(&cohort(), &NoopReporter).await.is_err());
    }

    #[tokio::test]
    async fn panicking_job_yields_error_and_others_finish() {
        let jobs: Vec<(u32, u32)> = (1..=4).map(|n| (n, n)).collect();
        let mut futures = spawn_bounded(jobs, 2, |n: u32| {
            if n == 3 {
                panic!("rule table exploded");
            }
            n * 10
        });

        let mut outcomes = BTreeMap::new();
        while let Some((key, outcome)) = futures.next().await {
            outcomes.insert(key, outcome.map_err(|e| e.to_string()));
        }

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[&1], Ok(10));
        assert_eq!(outcomes[&2], Ok(20));
        assert_eq!(outcomes[&4], Ok(40));
        let err = outcomes[&3].as_ref().unwrap_err();
        assert!(err.contains("task did not complete"), "{err}");
    }

    #[test]
    fn failed_jobs_are_recorded_as_empty() {
        let analyzer = analyzer(AnalysisConfig::default());

        match analyzer.context.empty_output(&JobKey::Question(4)) {
            JobOutput::Scan(scan) => assert_eq!(scan, CollusionScan::empty(4)),
            JobOutput::Exam(_) => panic!("expected a scan"),
        }

        match analyzer.context.empty_output(&JobKey::Student("dave".into())) {
            JobOutput::Exam(summary) => {
                assert_eq!(summary.student_id, "dave");
                assert_eq!(summary.total_questions, 0);
                assert_eq!(summary.max_score, 0);
                assert!(!summary.exam_suspicious);
            }
            JobOutput::Scan(_) => panic!("expected an exam summary"),
        }
    }

    #[test]
    fn budget_apportioned_in_question_order() {
        let students: BTreeMap<u32, usize> = [(2, 3), (0, 4), (1, 2)].into_iter().collect();
        let allowances = apportion_budget(&students, Some(8));
        assert_eq!(allowances[&0], Some(6));
        assert_eq!(allowances[&1], Some(1));
        assert_eq!(allowances[&2], Some(1));

        let unlimited = apportion_budget(&students, None);
        assert!(unlimited.values().all(Option::is_none));
    }
}
