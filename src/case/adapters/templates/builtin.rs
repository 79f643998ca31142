//! Task templates compiled into the crate.

use crate::case::{
    domain::CaseType,
    ports::{TaskTemplateSource, TemplateSourceError, TemplateSourceResult},
};
use crate::task_tree::domain::{TaskSlug, TaskTemplate, TaskTemplateNode, TaskTreeDomainError};

/// Default templates for every [`CaseType`].
///
/// The planning application template contains every path bound by the
/// default request task bindings, plus a hidden `consultation` subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplateSource;

impl BuiltinTemplateSource {
    /// Creates the source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TaskTemplateSource for BuiltinTemplateSource {
    fn template_for(&self, case_type: CaseType) -> TemplateSourceResult<TaskTemplate> {
        let built = match case_type {
            CaseType::PlanningApplication => planning_application(),
            CaseType::Enforcement => enforcement(),
            CaseType::PreApplication => pre_application(),
        };
        let template = built.map_err(|source| TemplateSourceError::Invalid { case_type, source })?;
        template
            .validate()
            .map_err(|source| TemplateSourceError::Invalid { case_type, source })?;
        Ok(template)
    }
}

fn node(name: &str, slug: &str) -> Result<TaskTemplateNode, TaskTreeDomainError> {
    Ok(TaskTemplateNode::new(name, TaskSlug::new(slug)?))
}

fn planning_application() -> Result<TaskTemplate, TaskTreeDomainError> {
    let check_and_validate = node("Check and validate", "check-and-validate")?.with_children([
        node("Check application details", "check-application-details")?.with_children([
            node("Check description", "check-description")?,
            node("Check red line boundary", "check-red-line-boundary")?.at_position(1),
            node("Check fee", "check-fee")?.at_position(2),
            node("Check constraints", "check-constraints")?
                .at_position(3)
                .optional(),
        ]),
        node("Check documents", "check-documents")?
            .at_position(1)
            .with_children([
                node("Check supplied documents", "check-supplied-documents")?,
                node("Check tagged documents", "check-tagged-documents")?
                    .at_position(1)
                    .optional(),
            ]),
        node("Review", "review")?.at_position(2).with_children([
            node("Other change requests", "other-change-requests")?.status_hidden(),
            node("Send validation decision", "send-validation-decision")?.at_position(1),
        ]),
    ]);
    let consultation = node("Consultation", "consultation")?
        .at_position(1)
        .hidden()
        .with_children([
            node("Select consultees", "select-consultees")?,
            node("Send consultations", "send-consultations")?.at_position(1),
            node("View consultee responses", "view-consultee-responses")?.at_position(2),
        ]);
    let assessment = node("Assessment", "assessment")?
        .at_position(2)
        .with_children([
            node("Check site history", "check-site-history")?.optional(),
            node("Write assessment report", "write-assessment-report")?.at_position(1),
            node("Add conditions", "add-conditions")?.at_position(2).optional(),
        ]);
    let review_and_submit = node("Review and submit", "review-and-submit")?
        .at_position(3)
        .with_children([node("Submit recommendation", "submit-recommendation")?]);
    Ok(TaskTemplate::new([
        check_and_validate,
        consultation,
        assessment,
        review_and_submit,
    ]))
}

fn enforcement() -> Result<TaskTemplate, TaskTreeDomainError> {
    let investigate = node("Investigate and respond", "investigate-and-respond")?.with_children([
        node("Check breach report", "check-breach-report")?,
        node("Visit site", "visit-site")?.at_position(1),
        node("Serve notice", "serve-notice")?.at_position(2).optional(),
    ]);
    let close = node("Close case", "close-case")?
        .at_position(1)
        .with_children([node("Record outcome", "record-outcome")?]);
    Ok(TaskTemplate::new([investigate, close]))
}

fn pre_application() -> Result<TaskTemplate, TaskTreeDomainError> {
    let check_and_validate = node("Check and validate", "check-and-validate")?.with_children([
        node("Check application details", "check-application-details")?.with_children([
            node("Check description", "check-description")?,
            node("Check fee", "check-fee")?.at_position(1),
        ]),
    ]);
    let advice = node("Prepare advice", "prepare-advice")?
        .at_position(1)
        .with_children([
            node("Hold meeting", "hold-meeting")?.optional(),
            node("Write advice report", "write-advice-report")?.at_position(1),
        ]);
    Ok(TaskTemplate::new([check_and_validate, advice]))
}
