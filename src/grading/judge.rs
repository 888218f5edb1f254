// src/grading/judge.rs

use crate::executor::{ExecError, ExecutionOutcome};

/// Pass/fail decision for one test case.
#[derive(Debug, Clone)]
pub struct TestVerdict {
    pub passed: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub execution_time: f64,
    pub compile_error: bool,
    pub runtime_error: bool,
}

/// Judges one execution result against a test case's expected output.
///
/// Priority order:
/// 1. client failure (timeout, rate limit, transport, remote error)
/// 2. compile-phase stderr
/// 3. non-zero run exit code
/// 4. trimmed stdout comparison, which additionally requires an *empty* run
///    stderr — a program that prints the right answer but also writes
///    diagnostics to stderr is marked failed. Existing test-case banks
///    depend on this policy.
pub fn judge(result: Result<ExecutionOutcome, ExecError>, expected_output: &str) -> TestVerdict {
    let outcome = match result {
        Err(err) => {
            return TestVerdict {
                passed: false,
                output: None,
                error: Some(err.to_string()),
                execution_time: 0.0,
                compile_error: false,
                runtime_error: false,
            };
        }
        Ok(outcome) => outcome,
    };

    if let Some(compile_stderr) = outcome
        .compile_stderr
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        return TestVerdict {
            passed: false,
            output: None,
            error: Some(compile_stderr.to_string()),
            execution_time: outcome.duration_seconds,
            compile_error: true,
            runtime_error: false,
        };
    }

    if outcome.exit_code != 0 {
        let error = if outcome.run_stderr.is_empty() {
            format!("Program exited with code {}", outcome.exit_code)
        } else {
            outcome.run_stderr.clone()
        };
        return TestVerdict {
            passed: false,
            output: Some(outcome.run_stdout.trim().to_string()),
            error: Some(error),
            execution_time: outcome.duration_seconds,
            compile_error: false,
            runtime_error: true,
        };
    }

    let actual = outcome.run_stdout.trim();
    let expected = expected_output.trim();
    let passed = actual == expected && outcome.run_stderr.is_empty();

    TestVerdict {
        passed,
        output: Some(actual.to_string()),
        error: (!outcome.run_stderr.is_empty()).then(|| outcome.run_stderr.clone()),
        execution_time: outcome.duration_seconds,
        compile_error: false,
        runtime_error: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_run(stdout: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            compile_stderr: None,
            run_stdout: stdout.to_string(),
            run_stderr: String::new(),
            exit_code: 0,
            duration_seconds: 0.25,
        }
    }

    #[test]
    fn client_failure_is_a_failing_verdict() {
        let verdict = judge(Err(ExecError::Timeout(10)), "42");
        assert!(!verdict.passed);
        assert_eq!(verdict.execution_time, 0.0);
        assert!(verdict.error.unwrap().contains("timed out"));
    }

    #[test]
    fn compile_stderr_wins_over_everything_else() {
        let outcome = ExecutionOutcome {
            compile_stderr: Some("main.c:3: error".to_string()),
            run_stdout: "42".to_string(),
            run_stderr: String::new(),
            exit_code: 0,
            duration_seconds: 0.5,
        };
        let verdict = judge(Ok(outcome), "42");
        assert!(!verdict.passed);
        assert!(verdict.compile_error);
        assert!(!verdict.runtime_error);
        assert_eq!(verdict.error.unwrap(), "main.c:3: error");
    }

    #[test]
    fn nonzero_exit_synthesizes_message_when_stderr_empty() {
        let outcome = ExecutionOutcome {
            exit_code: 2,
            ..clean_run("")
        };
        let verdict = judge(Ok(outcome), "");
        assert!(!verdict.passed);
        assert!(verdict.runtime_error);
        assert_eq!(verdict.error.unwrap(), "Program exited with code 2");
    }

    #[test]
    fn nonzero_exit_prefers_run_stderr() {
        let outcome = ExecutionOutcome {
            run_stderr: "Traceback: ZeroDivisionError".to_string(),
            exit_code: 1,
            ..clean_run("")
        };
        let verdict = judge(Ok(outcome), "");
        assert!(verdict.runtime_error);
        assert_eq!(verdict.error.unwrap(), "Traceback: ZeroDivisionError");
    }

    #[test]
    fn trimmed_output_match_passes() {
        let verdict = judge(Ok(clean_run("  42\n")), "42\n");
        assert!(verdict.passed);
        assert_eq!(verdict.output.unwrap(), "42");
        assert!(verdict.error.is_none());
        assert_eq!(verdict.execution_time, 0.25);
    }

    #[test]
    fn output_mismatch_fails() {
        let verdict = judge(Ok(clean_run("41")), "42");
        assert!(!verdict.passed);
        assert!(!verdict.runtime_error);
    }

    #[test]
    fn matching_output_with_stderr_noise_still_fails() {
        let outcome = ExecutionOutcome {
            run_stderr: "warning: deprecated".to_string(),
            ..clean_run("42")
        };
        let verdict = judge(Ok(outcome), "42");
        assert!(!verdict.passed);
        assert_eq!(verdict.error.unwrap(), "warning: deprecated");
    }
}
