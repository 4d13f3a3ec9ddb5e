#![forbid(unsafe_code)]

use log::info;
use poem::Request;

use crate::utils::errors::UseCaseError;
use crate::utils::http_utils::{self, RequestDebug};

// ***************************************************************************
//                                 Use Cases
// ***************************************************************************
/// A named unit of work binding one input type, one output type and the
/// function from one to the other.  Endpoints decode their parameters into
/// `Input`, run the use case through [`handle`] and encode `Output` or the
/// error according to its status kind.
pub trait UseCase {
    type Input: RequestDebug;
    type Output;

    /// Short name used in log records.
    const TITLE: &'static str;

    fn interact(&self, input: Self::Input) -> Result<Self::Output, UseCaseError>;
}

// ---------------------------------------------------------------------------
// handle:
// ---------------------------------------------------------------------------
/** Run a use case against decoded input, logging the request at debug level
 * and any rejection at info level.
 */
pub fn handle<U: UseCase>(use_case: &U, http_req: &Request, input: U::Input)
    -> Result<U::Output, UseCaseError> {
    http_utils::debug_request(http_req, &input);

    let result = use_case.interact(input);
    if let Err(e) = &result {
        info!("{} rejected {}: {}", U::TITLE, http_req.uri(), e);
    }
    result
}
