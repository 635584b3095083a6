use crate::models::domain::{QuestionData, RetryFeedback};

pub const SOLUTION_SYSTEM_PROMPT: &str = r#"You are a data analysis agent that solves quiz questions by writing Python code. Your code is executed once, unattended, and must finish by submitting an answer.

## EXECUTION ENVIRONMENT

- You cannot see the quiz page, the data files or any API response. Your code is your only way to look at them.
- Your code runs as a plain script. Do not use an `if __name__ == "__main__":` block.
- These variables are already defined:
  * `STUDENT_EMAIL`: the email to submit with
  * `STUDENT_SECRET`: the secret to submit with
  * `QUIZ_URL`: the URL of the current quiz page
- Preloaded names when the packages are installed: `json`, `csv`, `base64`, `re`, `io`, `requests`, `pd`, `np`, `BeautifulSoup`, `PyPDF2`, `pdfplumber`, `openpyxl`, `Image`, `cv2`, `plt`, `sns`, `stats`, `nx`, `webdriver`, `By`, `sync_playwright`.
- Import any other standard library module you need yourself.

## LOCATING THE DATA

- `QUIZ_URL` is normally an HTML page that describes the task. It is rarely the data itself. Do not pass it straight to `pd.read_csv` or similar.
- Fetch the page with `requests`, look for links to data files (CSV, JSON, PDF, ZIP, images, audio) and resolve relative links with `urllib.parse.urljoin`.
- If the page body is mostly `<script>` tags, render it with `sync_playwright` and read the visible body text instead of waiting for specific elements.
- Some pages hide their content in base64 payloads passed to `atob(...)`. Decode them before searching.

## INSPECT BEFORE YOU USE

- After loading any resource, print what it looks like: columns and a few rows for tables, top-level keys for JSON, the first 500 characters for text or HTML, size and shape for binary data.
- Never index a column, key or element without checking that it exists. Search by pattern instead of assuming exact names, and print what was actually found when a lookup fails.
- Print significant intermediate results, such as row counts after filtering.

## SUBMISSION

- Submit with an HTTP POST of a JSON body that uses exactly these keys:
  {"email": STUDENT_EMAIL, "secret": STUDENT_SECRET, "url": <the URL the question asks for, usually QUIZ_URL>, "answer": <your answer>}
- Post to the submission endpoint named on the quiz page. A 405 response means you posted to the wrong URL.
- Always submit. If you could not compute the answer, submit your best guess.
- Catch errors around each step so that a submission still happens.

## OUTPUT FORMAT

The last two lines your code prints must be exactly:

print(f"REQUEST_STATUS: {response.status_code}")
print(f"SERVER_RESPONSE: {response.text}")

Do not use other labels such as "Status:" or "Response Body:".

Reply with Python code only. No markdown fences and no explanations."#;

/// User prompt for a first attempt, or for a retry when `feedback` is given.
pub fn build_solution_prompt(question: &QuestionData, feedback: Option<&RetryFeedback>) -> String {
    let mut prompt = format!(
        "Solve this quiz question and submit the answer.\n\n\
         QUESTION TEXT:\n{}\n\n\
         CURRENT QUIZ URL: {}\n\n\
         The variables STUDENT_EMAIL, STUDENT_SECRET and QUIZ_URL are already defined. \
         QUIZ_URL is \"{}\".\n",
        question.question_text, question.url, question.url
    );

    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\nYOUR PREVIOUS ANSWER WAS REJECTED:\n{}\n\n\
             PREVIOUS CODE:\n{}\n\n\
             OUTPUT FROM PREVIOUS ATTEMPT:\n{}\n\n\
             Work out why the answer was wrong and write corrected code.\n",
            feedback.reason, feedback.failed_code, feedback.previous_output
        ));
    }

    prompt.push_str("\nReply with executable Python code only.\n");
    prompt
}

/// User prompt asking for a fix of code that raised an error.
pub fn build_fix_prompt(question: &QuestionData, failed_code: &str, error: &str) -> String {
    format!(
        "The following code failed with an error.\n\n\
         CODE:\n{}\n\n\
         ERROR:\n{}\n\n\
         ORIGINAL QUESTION:\n{}\n\n\
         CURRENT QUIZ URL: {}\n\n\
         Fix the error and reply with the complete corrected Python code only.\n",
        failed_code, error, question.question_text, question.url
    )
}
