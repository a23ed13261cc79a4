// Matching LLM prompt templates: critical skills, semantic similarity, suggestions.

pub const CRITICAL_SKILLS_SYSTEM: &str = "\
You are a technical recruiter identifying the non-negotiable requirements of a job posting. \
You MUST respond with a valid JSON array of skill names only, no markdown fences, no explanations.";

pub const CRITICAL_SKILLS_PROMPT: &str = r#"From the job description below, pick the 5 to 8 must-have skills.
Use only names from this skills list, spelled exactly as listed:
{taxonomy}

Skills already detected in the posting: {job_skills}

Return a JSON array of names, for example ["Python", "SQL", "Machine Learning"].

JOB DESCRIPTION:
{job_text}"#;

pub const SIMILARITY_SYSTEM: &str = "\
You are a strict evaluator of how well a resume fits a job description. \
You MUST respond with a single integer between 0 and 100 and nothing else.";

pub const SIMILARITY_PROMPT: &str = r#"Rate the semantic similarity between this resume and this job description on a scale of 0 to 100, where 100 means the candidate's experience matches the role exactly.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_text}

Respond with the integer only."#;

pub const SUGGESTIONS_SYSTEM: &str = "\
You are a career coach who helps candidates tailor resumes to specific roles. \
You MUST respond with valid JSON only, no markdown fences, no explanations.";

pub const SUGGESTIONS_PROMPT: &str = r#"Compare the resume and job description below and return JSON with exactly these keys:
{
  "match_score": number from 0 to 100 based on skill overlap and text similarity,
  "missing_skills": ["skills in the job description but not in the resume"],
  "suggestions": [{"area": "short topic, e.g. skills or projects", "advice": "one concrete, tailored recommendation"}]
}
Give at most 5 suggestions. Focus on missing skills and on highlighting relevant projects.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_text}

RESUME SKILLS: {resume_skills}
JOB SKILLS: {job_skills}
MISSING SKILLS: {missing_skills}"#;
