// Offline replies for when the proxy cannot be reached
pub const NO_RESPONSE: &str =
    "Sorry, I couldn't come up with a response just now. Could you try asking again?";

pub const DEFAULT_REPLY: &str = "I'm here to help with pregnancy, postpartum recovery and \
     parenting questions. Tell me a little more about what's on your mind, whether it's sleep, \
     nutrition, exercise, your baby's development or how you're feeling.";

pub struct Rule {
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        keywords: &["sleep", "tired", "rest", "exhausted"],
        reply: "Rest matters so much right now. Try to sleep when your baby sleeps, keep a \
                short wind-down routine in the evening and accept help with night feeds when \
                it's offered. If exhaustion feels overwhelming or doesn't ease, mention it to \
                your doctor or midwife.",
    },
    Rule {
        keywords: &["food", "diet", "eat", "nutrition"],
        reply: "A balanced plate helps your energy: lean protein, whole grains, fruit and \
                vegetables, plus calcium- and iron-rich foods. Keep water nearby through the \
                day, and ask your care provider whether you need any supplements such as \
                folic acid or vitamin D.",
    },
    Rule {
        keywords: &["exercise", "fitness", "workout", "yoga"],
        reply: "Gentle movement like walking, stretching or prenatal and postnatal yoga is a \
                great place to start. Build up slowly, stop if anything hurts, and check with \
                your doctor before returning to more intense workouts.",
    },
    Rule {
        keywords: &["baby", "development", "milestone", "newborn"],
        reply: "Every baby develops at their own pace. Lots of tummy time, talking, reading \
                and responsive play all support growth. Your pediatrician's regular checkups \
                are the best place to raise any concerns about milestones.",
    },
    Rule {
        keywords: &["anxious", "anxiety", "worried", "scared", "stress"],
        reply: "It's completely normal to feel worried sometimes. Slow breathing, a short \
                walk or talking with someone you trust can help. If anxious feelings persist \
                or start to affect daily life, please reach out to your doctor. You don't have \
                to handle this alone.",
    },
];

// First rule with a keyword in the lower-cased text wins
pub fn respond(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(DEFAULT_REPLY, |rule| rule.reply)
}
