// Analysis prompt templates.
// The critique instructions are synthesized per submission from the job
// context; the output schema below must stay in lockstep with
// `models::resume::Feedback`.

const FEEDBACK_INSTRUCTIONS: &str = r#"You are an experienced technical recruiter and resume reviewer.
Analyze the attached resume against the job it targets and score it honestly.
Low scores are expected and useful when the resume deserves them.

TARGET ROLE:
- Job title: {job_title}
- Job description: {job_description}

OUTPUT SCHEMA (return exactly this structure):
{
  "overallScore": number 0-100,
  "toneAndStyle": {
    "score": number 0-100,
    "tips": [{"type": "good" | "improve", "tip": "short headline", "explanation": "one or two sentences"}]
  },
  "content": { "score": number 0-100, "tips": [...] },
  "structure": { "score": number 0-100, "tips": [...] },
  "skills": { "score": number 0-100, "tips": [...] }
}

RULES:
1. Ground every tip in the resume or the job description; never invent experience.
2. In "skills", the "improve" tips must name the concrete skills the job asks for that the resume lacks or underplays — they drive a follow-up study plan.
3. Give three to four tips per category.
4. Return ONLY the JSON object — nothing else, no code fences."#;

/// Builds the critique instructions for one submission.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    FEEDBACK_INSTRUCTIONS
        .replace("{job_title}", job_title)
        .replace("{job_description}", job_description)
}
