use crate::models::{BatchReport, ProcessingOutcome};

/// Builds a [`BatchReport`] one outcome at a time.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    report: BatchReport,
}

impl ResultAggregator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            report: BatchReport {
                results: Vec::with_capacity(capacity),
                ..Default::default()
            },
        }
    }

    pub fn record(&mut self, outcome: ProcessingOutcome) {
        if outcome.is_success() {
            self.report.processed += 1;
        } else {
            self.report.failed += 1;
        }
        self.report.results.push(outcome);
    }

    pub fn finish(self) -> BatchReport {
        self.report
    }
}

/// Counts outcomes by status and keeps them in the order given.
pub fn collect<I>(outcomes: I) -> BatchReport
where
    I: IntoIterator<Item = ProcessingOutcome>,
{
    let mut aggregator = ResultAggregator::default();
    for outcome in outcomes {
        aggregator.record(outcome);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeStatus;

    #[test]
    fn test_collect_counts_by_status() {
        let report = collect(vec![
            ProcessingOutcome::success("a.pdf"),
            ProcessingOutcome::processing_error("b.pdf", "upstream failed"),
            ProcessingOutcome::validation_error("c.txt", "unsupported"),
            ProcessingOutcome::success("d.pdf"),
        ]);

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.total(), 4);
        let names: Vec<_> = report.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.txt", "d.pdf"]);
        assert_eq!(report.results[2].status, OutcomeStatus::ValidationError);
    }

    #[test]
    fn test_collect_empty() {
        let report = collect(Vec::<ProcessingOutcome>::new());
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let report = collect(vec![
            ProcessingOutcome::success("same.pdf"),
            ProcessingOutcome::success("same.pdf"),
        ]);
        assert_eq!(report.processed, 2);
        assert_eq!(report.results.len(), 2);
    }
}
