// src/assistant/fallback.rs
//! Canned answers served when the upstream response is empty or malformed.
//! Keyword-matched against the user's question so the degradation at least
//! lands in the right topic.

const CV_KEYWORDS: &[&str] = &["cv", "życiorys"];
const INTERVIEW_KEYWORDS: &[&str] = &["rozmowa", "rekrutacja"];

const CV_ANSWER: &str = "\
Przepraszam, nie mogłem przetworzyć Twojego pytania o CV. Oto kilka ogólnych wskazówek:

**Podstawowe elementy CV:**
- Dane kontaktowe
- Doświadczenie zawodowe (od najnowszego)
- Wykształcenie
- Umiejętności techniczne
- Języki obce

**Wskazówki:**
- Dostosuj CV do konkretnej oferty pracy
- Używaj konkretnych liczb i osiągnięć
- Maksymalnie 2 strony A4

Spróbuj zadać bardziej konkretne pytanie, np. \"Jak napisać CV na stanowisko junior developera?\"";

const INTERVIEW_ANSWER: &str = "\
Nie udało mi się odpowiedzieć na Twoje pytanie o rozmowę kwalifikacyjną. Oto podstawowe wskazówki:

**Przygotowanie do rozmowy:**
- Zbadaj firmę i stanowisko
- Przygotuj pytania do rekrutera
- Ćwicz odpowiedzi na typowe pytania
- Przygotuj przykłady swoich osiągnięć

**Podczas rozmowy:**
- Bądź punktualny
- Słuchaj uważnie
- Zadawaj przemyślane pytania
- Pokazuj entuzjazm

Możesz spróbować zadać bardziej szczegółowe pytanie.";

const GENERIC_ANSWER: &str = "\
Przepraszam, nie mogłem przetworzyć Twojego pytania. Jako CareerGPT mogę pomóc Ci w:

- **Pisaniu CV** - dostosowanie do stanowiska, formatowanie, treść
- **Przygotowaniu do rozmowy** - typowe pytania, negocjacje, prezentacja
- **Planowaniu kariery** - zmiana branży, rozwój kompetencji
- **Analizie ofert pracy** - co oznaczają wymagania, czy warto aplikować

Spróbuj zadać bardziej konkretne pytanie z jednego z tych obszarów.";

/// Pick the canned answer closest to the user's topic.
pub fn fallback_answer(user_message: &str) -> &'static str {
    let lower = user_message.to_lowercase();

    if CV_KEYWORDS.iter().any(|k| lower.contains(k)) {
        CV_ANSWER
    } else if INTERVIEW_KEYWORDS.iter().any(|k| lower.contains(k)) {
        INTERVIEW_ANSWER
    } else {
        GENERIC_ANSWER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cv_questions_get_the_cv_answer() {
        assert!(fallback_answer("Jak poprawić moje CV?").contains("elementy CV"));
        assert!(fallback_answer("życiorys zawodowy").contains("elementy CV"));
    }

    #[test]
    fn interview_questions_get_the_interview_answer() {
        let answer = fallback_answer("Jak przygotować się do rozmowy kwalifikacyjnej?");
        assert!(answer.contains("Przygotowanie do rozmowy"));
        assert!(fallback_answer("proces rekrutacji").contains("Przygotowanie do rozmowy"));
    }

    #[test]
    fn everything_else_gets_the_generic_answer() {
        assert!(fallback_answer("Ile zarabia programista?").contains("CareerGPT"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(fallback_answer("POPRAW MOJE CV").contains("elementy CV"));
    }
}
