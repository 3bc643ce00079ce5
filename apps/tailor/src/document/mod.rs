// Document I/O at the edges of the pipeline: text extraction from uploaded
// resumes and text or .docx output of generated documents.

pub mod extract;
pub mod writer;
