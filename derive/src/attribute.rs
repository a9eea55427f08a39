use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Error, Expr, Ident, Result, Token, Type, parenthesized,
    parse::{Parse, ParseStream},
};

/// Options of a field's `#[bin(...)]` attributes.
#[derive(Debug, Default)]
pub(crate) struct FieldAttribute {
    pub(crate) skip: Option<Ident>,
    len: Option<Expr>,
    seek: Vec<(Origin, Expr)>,
    with: Option<Ident>,
    order: Option<Order>,
    elem: Option<Box<FieldAttribute>>,
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Start,
    Current,
    End,
}

#[derive(Debug, Clone, Copy)]
enum Order {
    Little,
    Big,
}

impl FieldAttribute {
    /// Collect the options of every `#[bin(...)]` attribute on a field.
    pub(crate) fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut attribute = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("bin")) {
            attr.parse_args_with(|input: ParseStream| attribute.extend(input))?;
        }

        if let Some(skip) = &attribute.skip {
            if !attribute.is_plain() {
                Err(Error::new_spanned(
                    skip,
                    "`skip` cannot be combined with other options.",
                ))?
            }
        }

        Ok(attribute)
    }

    fn is_plain(&self) -> bool {
        self.len.is_none()
            && self.seek.is_empty()
            && self.with.is_none()
            && self.order.is_none()
            && self.elem.is_none()
    }

    fn extend(&mut self, input: ParseStream) -> Result<()> {
        while !input.is_empty() {
            let key = input.parse::<Ident>()?;

            match key.to_string().as_str() {
                "skip" => once(&mut self.skip, key.clone(), &key)?,
                "len" => {
                    input.parse::<Token![=]>()?;
                    once(&mut self.len, input.parse()?, &key)?;
                }
                "offset" | "offset_start" | "offset_end" => {
                    input.parse::<Token![=]>()?;
                    let origin = match key.to_string().as_str() {
                        "offset_start" => Origin::Start,
                        "offset_end" => Origin::End,
                        _ => Origin::Current,
                    };
                    self.seek.push((origin, input.parse()?));
                }
                "with" => {
                    input.parse::<Token![=]>()?;
                    once(&mut self.with, input.parse()?, &key)?;
                }
                "order" => {
                    input.parse::<Token![=]>()?;
                    let value = input.parse::<Ident>()?;
                    let order = match value.to_string().as_str() {
                        "little" => Order::Little,
                        "big" => Order::Big,
                        _ => Err(Error::new_spanned(
                            value,
                            "Byte order must be `little` or `big`.",
                        ))?,
                    };
                    once(&mut self.order, order, &key)?;
                }
                "elem" => {
                    let content;
                    parenthesized!(content in input);
                    let mut elem = Self::default();
                    elem.extend(&content)?;
                    once(&mut self.elem, Box::new(elem), &key)?;
                }
                _ => Err(Error::new_spanned(
                    &key,
                    "Unknown option; expected one of `skip`, `len`, `offset`, `offset_start`, `offset_end`, `with`, `order` or `elem`.",
                ))?,
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(())
    }

    /// Expression building the `Directive` for these options.
    ///
    /// Bindings may use `self` and `?`, so the expression must sit in a method
    /// of the record returning `Result<_, DirectiveError>`.
    pub(crate) fn directive(&self) -> TokenStream {
        let mut tokens = quote! { ::bytebind::Directive::new() };

        if self.skip.is_some() {
            tokens.extend(quote! { .ignore() });
        }

        if let Some(len) = &self.len {
            tokens.extend(quote! { .length(::bytebind::directive::length(#len)?) });
        }

        for (origin, offset) in &self.seek {
            let whence = match origin {
                Origin::Start => quote! { Start },
                Origin::Current => quote! { Current },
                Origin::End => quote! { End },
            };
            tokens.extend(quote! {
                .seek(::bytebind::directive::offset(#offset)?, ::bytebind::Whence::#whence)
            });
        }

        if let Some(with) = &self.with {
            let routine = with.to_string();
            tokens.extend(quote! { .delegate(#routine) });
        }

        if let Some(order) = self.order {
            let order = match order {
                Order::Little => quote! { Little },
                Order::Big => quote! { Big },
            };
            tokens.extend(quote! { .order(::bytebind::ByteOrder::#order) });
        }

        if let Some(elem) = &self.elem {
            let elem = elem.directive();
            tokens.extend(quote! { .element(#elem) });
        }

        tokens
    }
}

/// A routine declared with `decoder(...)` on a record.
#[derive(Debug)]
pub(crate) struct Decoder {
    pub(crate) method: Ident,
    /// The produced type, for routines returning a value.
    pub(crate) output: Option<Type>,
}

/// Options of a record's `#[bin(...)]` attributes.
#[derive(Debug, Default)]
pub(crate) struct RecordAttribute {
    pub(crate) decoders: Vec<Decoder>,
}

impl RecordAttribute {
    pub(crate) fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut attribute = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("bin")) {
            let RecordAttribute { decoders } = attr.parse_args()?;

            for decoder in decoders {
                if attribute.decoders.iter().any(|d| d.method == decoder.method) {
                    Err(Error::new_spanned(
                        &decoder.method,
                        "Decoders must be declared once.",
                    ))?
                }
                attribute.decoders.push(decoder);
            }
        }

        Ok(attribute)
    }
}

impl Parse for RecordAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut decoders = Vec::new();

        while !input.is_empty() {
            let key = input.parse::<Ident>()?;
            if key != "decoder" {
                Err(Error::new_spanned(key, "Unknown option; expected `decoder`."))?
            }

            let content;
            parenthesized!(content in input);
            decoders.push(content.parse()?);

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self { decoders })
    }
}

impl Parse for Decoder {
    fn parse(input: ParseStream) -> Result<Self> {
        let method = input.parse::<Ident>()?;

        let output = if input.peek(Token![->]) {
            input.parse::<Token![->]>()?;
            Some(input.parse::<Type>()?)
        } else {
            None
        };

        Ok(Self { method, output })
    }
}

/// Fill an option, rejecting repeats.
fn once<T>(slot: &mut Option<T>, value: T, key: &Ident) -> Result<()> {
    if slot.replace(value).is_some() {
        Err(Error::new_spanned(
            key,
            format!("Option `{key}` may only be given once."),
        ))?
    }

    Ok(())
}
