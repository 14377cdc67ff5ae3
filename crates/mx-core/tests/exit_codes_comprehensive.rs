//! Comprehensive exit code tests for mortyx.
//!
//! These tests pin the numeric contract and the error-to-code mapping.

use mx_common::Error;
use mx_core::exit_codes::ExitCode;

const ALL: [ExitCode; 11] = [
    ExitCode::Clean,
    ExitCode::StepCapReached,
    ExitCode::Interrupted,
    ExitCode::ArgsError,
    ExitCode::ConfigError,
    ExitCode::AuthError,
    ExitCode::NetworkError,
    ExitCode::InternalError,
    ExitCode::IoError,
    ExitCode::TimeoutError,
    ExitCode::ProtocolError,
];

// ============================================================================
// Exit Code Value Tests
// ============================================================================

mod exit_code_values {
    use super::*;

    #[test]
    fn operational_codes_are_0_to_6() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::StepCapReached.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.as_i32(), 6);
    }

    #[test]
    fn user_error_codes_are_10_to_19() {
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::AuthError.as_i32(), 12);
        assert_eq!(ExitCode::NetworkError.as_i32(), 14);
    }

    #[test]
    fn internal_error_codes_are_20_plus() {
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
        assert_eq!(ExitCode::TimeoutError.as_i32(), 22);
        assert_eq!(ExitCode::ProtocolError.as_i32(), 23);
    }

    #[test]
    fn from_trait_matches_as_i32() {
        for code in ALL {
            let via_from: i32 = code.into();
            assert_eq!(via_from, code.as_i32());
        }
    }
}

// ============================================================================
// Classification Tests
// ============================================================================

mod classification {
    use super::*;

    #[test]
    fn every_code_is_in_exactly_one_range() {
        for code in ALL {
            let ranges = [
                code.is_operational(),
                code.is_user_error(),
                code.is_internal_error(),
            ];
            assert_eq!(
                ranges.iter().filter(|&&r| r).count(),
                1,
                "{} classified into {:?}",
                code,
                ranges
            );
        }
    }

    #[test]
    fn only_finished_episodes_are_success() {
        let successes: Vec<_> = ALL.iter().filter(|c| c.is_success()).collect();
        assert_eq!(
            successes,
            vec![&ExitCode::Clean, &ExitCode::StepCapReached]
        );
    }

    #[test]
    fn interrupted_is_neither_success_nor_error() {
        assert!(!ExitCode::Interrupted.is_success());
        assert!(!ExitCode::Interrupted.is_error());
    }

    #[test]
    fn code_names_are_unique() {
        let mut names: Vec<_> = ALL.iter().map(|c| c.code_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }
}

// ============================================================================
// Error Mapping Tests
// ============================================================================

mod error_mapping {
    use super::*;

    #[test]
    fn config_problems_are_user_errors() {
        assert_eq!(
            ExitCode::from(&Error::Config("bad epsilon".into())),
            ExitCode::ConfigError
        );
        assert_eq!(ExitCode::from(&Error::MissingCredential), ExitCode::ArgsError);
    }

    #[test]
    fn transport_failures() {
        assert_eq!(ExitCode::from(&Error::Auth { status: 401 }), ExitCode::AuthError);
        assert_eq!(
            ExitCode::from(&Error::Transport("refused".into())),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::from(&Error::Timeout { seconds: 30 }),
            ExitCode::TimeoutError
        );
        assert_eq!(
            ExitCode::from(&Error::MalformedResponse {
                endpoint: "/api/mortys/portal/".into(),
                message: "missing field".into(),
            }),
            ExitCode::ProtocolError
        );
    }

    #[test]
    fn cancellation_is_interrupted() {
        assert_eq!(
            ExitCode::from(&Error::Cancelled { steps: 12 }),
            ExitCode::Interrupted
        );
    }

    #[test]
    fn io_and_json() {
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
        let json = Error::Json(serde_json::from_str::<u32>("nope").unwrap_err());
        assert_eq!(ExitCode::from(&json), ExitCode::InternalError);
    }
}
