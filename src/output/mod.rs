mod document;
mod writer;

pub use document::{
    render_bibliography, render_paper, render_section, render_title, CONCLUSION_HEADING,
    INTRODUCTION_HEADING,
};
pub use writer::DocumentWriter;
