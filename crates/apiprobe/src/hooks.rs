//! Before and after hooks
//!
//! Before hooks may mutate the freshly built request of each attempt. After
//! hooks observe the response together with the validation errors collected
//! so far. Both return errors as values, tagged like predicates.

use apiprobe_core::ClassifiedError;

use crate::assert::Registration;
use crate::request::PreparedRequest;
use crate::response::HttpResponse;

pub type BeforeHook = dyn Fn(&mut PreparedRequest) -> Result<(), ClassifiedError> + Send + Sync;

pub type AfterHook =
    dyn Fn(&HttpResponse, &[ClassifiedError]) -> Result<(), ClassifiedError> + Send + Sync;

/// Run before hooks in order, stopping at the first failure
pub fn run_before(
    hooks: &[Registration<BeforeHook>],
    request: &mut PreparedRequest,
) -> Option<ClassifiedError> {
    hooks.iter().find_map(|hook| {
        (hook.check())(request)
            .err()
            .map(|err| hook.decorate(err))
    })
}

/// Run every after hook, collecting their failures
pub fn run_after(
    hooks: &[Registration<AfterHook>],
    response: &HttpResponse,
    errors: &[ClassifiedError],
) -> Vec<ClassifiedError> {
    hooks
        .iter()
        .filter_map(|hook| {
            (hook.check())(response, errors)
                .err()
                .map(|err| hook.decorate(err))
        })
        .collect()
}
