pub mod case_type;
pub mod history_followup;
pub mod interview;
pub mod patient;
pub mod results;
pub mod symptom_entry;
pub mod vitals;

pub use case_type::CaseTypeStep;
pub use history_followup::HistoryFollowupStep;
pub use interview::InterviewStep;
pub use patient::PatientStep;
pub use results::ResultsStep;
pub use symptom_entry::SymptomEntryStep;
pub use vitals::VitalsStep;
