//! 预置回复模板
//!
//! 结束类模板各有一条特征句（首句），渲染后的内容一旦出现在对话中即触发终止；
//! completion_markers() 汇总这些特征句供 TerminationPolicy 使用。

use crate::backend::{EnrollmentOutcome, TicketOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    OnboardingEducation,
    AccountOnHold,
    ActiveListing,
    InactiveListing,
    ArchivedListing,
    ReadyForActivation,
    BlockedListing,
    SellerStateChange,
    BrandApprovalPending,
    BrandTrademarkIssue,
    ApiFailure,
    ListingIdHelp,
    GeneralHelp,
    TicketRaised,
    BrandAssureEnrollment,
}

impl Template {
    pub const ALL: [Template; 15] = [
        Template::OnboardingEducation,
        Template::AccountOnHold,
        Template::ActiveListing,
        Template::InactiveListing,
        Template::ArchivedListing,
        Template::ReadyForActivation,
        Template::BlockedListing,
        Template::SellerStateChange,
        Template::BrandApprovalPending,
        Template::BrandTrademarkIssue,
        Template::ApiFailure,
        Template::ListingIdHelp,
        Template::GeneralHelp,
        Template::TicketRaised,
        Template::BrandAssureEnrollment,
    ];

    /// 模板正文；含 `{...}` 占位符的模板需经对应 render_* 函数填充
    pub fn text(&self) -> &'static str {
        match self {
            Template::OnboardingEducation => "\
Your account is still in the onboarding phase. To complete the process:
1. Complete all verification steps
2. Submit required documentation
3. Wait for approval
Please visit seller.flipkart.com for more details.",
            Template::AccountOnHold => "\
Your account is currently on hold. This means:
1. Some verification steps may be pending
2. There might be compliance issues to address
Please check your seller dashboard for specific details.",
            Template::ActiveListing => "\
Good news! Your listing is currently active and visible to customers.
If you're still experiencing issues, please:
1. Check if the listing is in the correct category
2. Verify all required fields are filled
3. Ensure pricing and inventory are updated",
            Template::InactiveListing => "\
Your listing is currently inactive. To activate it:
1. Go to your Seller Dashboard
2. Navigate to 'My Listings'
3. Find the listing and click 'Activate'",
            Template::ArchivedListing => "\
This listing is currently archived. To make it active:
1. Go to Archived Listings in your dashboard
2. Select the listing
3. Click on 'Restore Listing'
4. Update any outdated information
5. Activate the listing",
            Template::ReadyForActivation => "\
Your listing is ready for activation. To make it live:
1. Open the listing from 'My Listings'
2. Review stock and price
3. Click 'Activate'",
            Template::BlockedListing => "\
Your listing has been blocked due to {reason}.
Current override status: {override_status}
Next steps: {next_steps}",
            Template::SellerStateChange => "\
Your listing was blocked because of a change in your seller account state.
Listings are restored automatically once the account is back to active.
No ticket is needed; please check the account notifications on your seller dashboard.",
            Template::BrandApprovalPending => "\
Your brand approval for this listing is still pending.
The listing will be reviewed again once the BrandXVertical approval is decided.
Please check back in 2-3 business days.",
            Template::BrandTrademarkIssue => "\
This listing was flagged for brand/trademark concerns.
Options available:
1. Provide brand authorization documentation
2. Apply for Brand Assure Program
3. Remove trademark-infringing elements
Please ensure all brand-related documentation is authentic and up-to-date.",
            Template::ApiFailure => "\
We're experiencing technical difficulties checking your listing status.
Please:
1. Try again in a few minutes
2. Ensure your listing ID is correct
3. Contact seller support if the issue persists",
            Template::ListingIdHelp => "\
To find your Listing ID (FSN):
1. Click on listing tab on seller dashboard
2. On my listing tab click on edit listing icon
3. Find Listing ID on top right
Please provide the Listing ID in the format: FSN123456789012",
            Template::GeneralHelp => "\
I'm here to help with your listing issues. To assist you better, please:
1. Provide your Listing ID (FSN)
2. Describe the specific issue you're facing
3. Share any error messages you're seeing",
            Template::TicketRaised => "\
Your support ticket has been raised.
Ticket ID: {ticket_id}
Status: {status}
Ticket type: {ticket_type}
Listing ID: {listing_id}
Reason: {reason_code}
Our team will review the listing and update you on the ticket.",
            Template::BrandAssureEnrollment => "\
You can enroll this listing in the brand program to get it reinstated.
Program: {program_id}
Listing ID: {listing_id}
Enrollment link: {enrollment_link}",
        }
    }

    /// 结束类模板的特征句；非结束模板返回 None
    pub fn signature(&self) -> Option<&'static str> {
        match self {
            Template::BrandTrademarkIssue | Template::ListingIdHelp | Template::GeneralHelp => None,
            other => other.text().lines().next(),
        }
        .map(|line| line.split('{').next().unwrap_or(line).trim())
    }

    pub fn is_terminal(&self) -> bool {
        self.signature().is_some()
    }
}

/// 全部结束模板的特征句
pub fn completion_markers() -> Vec<String> {
    Template::ALL
        .iter()
        .filter_map(|t| t.signature())
        .map(str::to_string)
        .collect()
}

pub fn render_blocked_listing(reason: &str, override_status: &str, next_steps: &str) -> String {
    Template::BlockedListing
        .text()
        .replace("{reason}", reason)
        .replace("{override_status}", override_status)
        .replace("{next_steps}", next_steps)
}

pub fn render_ticket_raised(ticket: &TicketOutcome) -> String {
    Template::TicketRaised
        .text()
        .replace("{ticket_id}", &ticket.ticket_id)
        .replace("{status}", &ticket.status)
        .replace("{ticket_type}", &ticket.ticket_type)
        .replace("{listing_id}", &ticket.listing_id)
        .replace("{reason_code}", &ticket.reason_code)
}

pub fn render_enrollment(enrollment: &EnrollmentOutcome) -> String {
    Template::BrandAssureEnrollment
        .text()
        .replace("{program_id}", &enrollment.program_id)
        .replace("{listing_id}", &enrollment.listing_id)
        .replace("{enrollment_link}", &enrollment.enrollment_link)
}
