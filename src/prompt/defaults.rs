//! Built-in prompt templates, written out by `hausarbeit init`

pub const EXTRACT: &str = r#"{input}

Use JSON, to extract topic, title and question.
Answer with a JSON object with exactly the string keys "topic", "title" and "question".
"#;

pub const BULLETS: &str = r#"You are planning an academic term paper written in {language}.

Topic: {topic}
Title: {title}
Research question: {question}

Create an outline with exactly {count} bullet points. Every bullet point becomes one
chapter of the paper, in the order you list them. Write the bullet points in {language}.

Answer with a JSON object of the form {{"bulletpoints": ["...", "..."]}}.
"#;

pub const EXTEND: &str = r#"You are writing one chapter of an academic term paper in {language}.
The paper is about: {topic}

Chapter: {bulletpoint}

Research material for this chapter:
---
{materials}
---

Write the chapter as continuous academic prose in {language}. Base your statements on the
research material where possible. Do not repeat the chapter heading.
"#;

pub const INTRO: &str = r#"Write the introduction of an academic term paper in {language}.
The paper is about: {topic}
Research question: {question}

The paper has the following structure:
{bulletpoints}

Introduce the topic, motivate the research question and briefly walk the reader through
the structure above. Do not add a heading.
"#;

pub const CONCLUSION: &str = r#"Write the conclusion of an academic term paper in {language}.
The paper is about: {topic}
Research question: {question}

The paper covered the following points:
{bulletpoints}

Summarize the findings, answer the research question and name open points for further
work. Do not add a heading.
"#;

pub const SUMMARIZE: &str = r#"Summarize the attached document in {language}.
Focus on everything that is relevant for the following chapter of a term paper:
{bulletpoint}

Keep facts, figures and definitions. Leave out everything unrelated.
"#;
