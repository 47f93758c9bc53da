//! Static menu replies. The route table is scanned in declared order and
//! the first keyword hit wins; anything unmatched gets the help text. All
//! bodies are fixed templates so replies are byte-for-byte reproducible.

const SERVICES_TEXT: &str = "*NOSSOS SERVICOS* 💅

• *Manicure simples* - R$ 25
• *Manicure com esmaltacao* - R$ 35
• *Pedicure* - R$ 30
• *Alongamento de gel* - R$ 80
• *Spa dos pes* - R$ 40

Digite \"1\" para AGENDAR!";

const PRICES_TEXT: &str = "*TABELA DE PRECOS* 💰

*MANICURE:*
• Simples - R$ 25
• Com esmaltacao - R$ 35

*PEDICURE:*
• Basico - R$ 30
• Com spa dos pes - R$ 40

*ALONGAMENTOS:*
• Gel - R$ 80
• Manutencao - R$ 50

Digite \"1\" para AGENDAR!";

const LOCATION_TEXT: &str = "*LOCALIZACAO* 📍

*Esmalteria Beauty*
Rua das Flores, 123 - Centro
Diadema - SP

*Horario:* Seg a Sab - 9h as 19h

Digite \"1\" para AGENDAR!";

const HELP_TEXT: &str = "Desculpe, nao entendi! 😊

Digite:
*1* ou *AGENDAR* 📅 - Reservar horario
*2* ou *SERVICOS* 💅 - Ver servicos
*3* ou *PRECOS* 💰 - Consultar valores
*4* ou *LOCAL* 📍 - Nossa localizacao

Ou *OI* para o menu principal!";

#[derive(Debug, Clone, Copy)]
enum Route {
    MainMenu,
    Services,
    Prices,
    Location,
}

const ROUTES: &[(&[&str], Route)] = &[
    (&["oi", "ola", "menu"], Route::MainMenu),
    (&["2", "servico"], Route::Services),
    (&["3", "preco"], Route::Prices),
    (&["4", "local"], Route::Location),
];

/// Pick the menu reply for an already-normalized message.
pub fn menu_reply(normalized: &str, customer_name: &str) -> String {
    for (keywords, route) in ROUTES {
        if keywords.iter().any(|kw| normalized.contains(kw)) {
            return match route {
                Route::MainMenu => main_menu_text(customer_name),
                Route::Services => SERVICES_TEXT.to_string(),
                Route::Prices => PRICES_TEXT.to_string(),
                Route::Location => LOCATION_TEXT.to_string(),
            };
        }
    }
    HELP_TEXT.to_string()
}

fn main_menu_text(customer_name: &str) -> String {
    format!(
        "Ola {customer_name}! Sou o assistente da Esmalteria! 💅

*Como posso ajudar?*

1️⃣ - AGENDAR horario
2️⃣ - VER servicos
3️⃣ - CONSULTAR precos
4️⃣ - LOCALIZACAO

Digite o numero da opcao desejada!"
    )
}
